// Weak reference resolution
//
// Events point at locations by ID only. The event stays valid when the
// location disappears; the reference just stops resolving.

use crate::domain::{Event, Location, LocationFilter};
use crate::error::Result;
use crate::port::LocationRepository;

/// Resolve the location an event refers to.
///
/// `None` when the event has no location or the location is not (or no
/// longer) visible. Other errors propagate.
pub async fn resolve_event_location(
    locations: &dyn LocationRepository,
    event: &Event,
) -> Result<Option<Location>> {
    let Some(location_id) = &event.location_id else {
        return Ok(None);
    };

    match locations
        .get_locations(&LocationFilter::by_id(location_id.clone()))
        .await
    {
        Ok(found) => Ok(found.into_iter().next()),
        Err(e) if e.is_not_found() => {
            tracing::debug!(
                event_id = %event.id,
                location_id = %location_id,
                "Event location no longer resolves"
            );
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewEvent;
    use crate::error::AppError;
    use async_trait::async_trait;

    /// Location store answering with a fixed outcome
    struct FixedLocations(fn() -> Result<Vec<Location>>);

    #[async_trait]
    impl LocationRepository for FixedLocations {
        async fn upsert_locations(&self, _locations: &[Location]) -> Result<()> {
            Ok(())
        }

        async fn get_locations(&self, _filter: &LocationFilter) -> Result<Vec<Location>> {
            (self.0)()
        }

        async fn delete_location_by_id(&self, _id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn event_at(location_id: Option<String>) -> Event {
        let mut params = NewEvent::named("Ballern");
        params.location_id = location_id;
        Event::new(params).unwrap()
    }

    #[test]
    fn test_no_location_set() {
        let repo = FixedLocations(|| panic!("must not be queried"));
        let resolved = tokio_test::block_on(resolve_event_location(&repo, &event_at(None)));
        assert!(resolved.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_location_resolves() {
        let location = Location::new("Tille");
        let repo = FixedLocations(|| Ok(vec![Location::new("Tille")]));

        let resolved = resolve_event_location(&repo, &event_at(Some(location.id)))
            .await
            .unwrap();
        assert_eq!(resolved.unwrap().name, "Tille");
    }

    #[tokio::test]
    async fn test_missing_location_is_absent() {
        let repo = FixedLocations(|| Err(AppError::NotFound("location".to_string())));
        let resolved = resolve_event_location(&repo, &event_at(Some(crate::domain::new_id())))
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_storage_errors_propagate() {
        let repo = FixedLocations(|| Err(AppError::Database("disk I/O error".to_string())));
        let event = event_at(Some(crate::domain::new_id()));
        let err = tokio_test::assert_err!(tokio_test::block_on(resolve_event_location(
            &repo, &event
        )));
        assert_eq!(err.kind(), crate::ErrorKind::Database);
    }
}
