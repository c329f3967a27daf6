// Application Layer - Use cases spanning more than one repository

pub mod references;

pub use references::resolve_event_location;
