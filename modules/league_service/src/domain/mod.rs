//! Domain layer - business logic and services

pub mod events;
pub mod factory;
pub mod payments;
pub mod realtime;
pub mod registration;
pub mod repository;
pub mod service;
pub mod validation;

pub use events::{ChangeFeed, ChangeKind, ChangeNotification, ChangePublisher, NoOpChangePublisher};
pub use factory::{DataBackend, Entity, FactoryError, Repositories, Stores};
pub use realtime::{LiveSubscription, LiveTopic, LiveUpdate, LiveUpdates, ReconnectPolicy};
pub use service::Service;
