pub mod matching_service;
pub mod ride_session_service;

#[cfg(test)]
mod ride_session_service_tests;

pub use matching_service::{MatchingCoordinator, MatchingDependencies, RideIntent};
pub use ride_session_service::{RideSessionCoordinator, RideSessionDependencies};
