//! Account module for nimbus.
//!
//! This module provides:
//! - Users (identity records with case-insensitive usernames)
//! - Services (subscription plans with a fixed capacity)
//! - Profiles (one per user, linking it to a service and a language)
//! - Registration, which provisions a profile and the user's storages

mod profile;
mod registration;
mod service;
mod user;
pub mod validation;

pub use profile::{NewProfile, Profile, ProfileRepository, ProfileUpdate};
pub use registration::{register, Registration, RegistrationRequest};
pub use service::{
    Capacity, NewService, Service, ServiceRepository, ServiceUpdate, MAX_SERVICE_NAME_LENGTH,
};
pub use user::{NewUser, User, UserRepository};
pub use validation::ValidationError;
