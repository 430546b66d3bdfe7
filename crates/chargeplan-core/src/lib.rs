//! # chargeplan-core: Depot Planning Data Model
//!
//! Provides the static input dataset and shared types for day-ahead
//! fleet-composition and charging-schedule planning:
//!
//! - [`Catalog`]: tour table, truck-type and charger-type tables, grid,
//!   storage and price constants. Immutable input, validated as a whole
//!   before any model is built.
//! - [`TimeGrid`]: the operating day discretized into fixed-width
//!   intervals, partitioned into a day band and a night band, with the
//!   per-tour membership predicates the model builder generates
//!   constraints from.
//! - [`units`]: `#[repr(transparent)]` newtypes (kW, kWh, km) that stop
//!   unit mix-ups at compile time.
//! - [`PlanError`] / [`PlanResult`]: the unified error type used across
//!   the chargeplan crates.
//!
//! The planning day is a fixed, repeating operating pattern: tours,
//! vehicle energy and storage energy all close cyclically over the day.
//! This crate contains no optimization logic; the model builder lives in
//! `chargeplan-milp`.

pub mod catalog;
pub mod error;
pub mod timegrid;
pub mod units;

pub use catalog::{
    Catalog, ChargerType, ChargerTypeId, Economics, GridConnection, Powertrain, StorageParams,
    Tour, TourId, TruckType, TruckTypeId,
};
pub use error::{PlanError, PlanResult};
pub use timegrid::{Interval, TimeGrid};
pub use units::{Kilometers, KilowattHours, Kilowatts};
