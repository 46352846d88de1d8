// --- File: crates/dimple_booking/src/lib.rs ---
//! Booking domain for Dimple: entities, the lifecycle state machine, the
//! booking application service and its REST surface.

pub mod doc;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod logic;
pub mod models;
pub mod routes;
pub mod store;

pub use error::BookingError;
pub use lifecycle::{check_transition, TransitionDenied};
pub use logic::{BookingService, CreateBookingRequest, CreateRatingRequest, UpdateStatusRequest};
pub use models::{
    Actor, Booking, BookingStatus, PaymentAttemptStatus, PaymentRecord, PaymentStatus,
    ProviderProfile, Rating, Role,
};
pub use store::{
    memory::MemoryStore, BookingRepository, Page, PaymentApplication, PaymentRepository,
    ProviderRepository, Store, StoreError,
};
