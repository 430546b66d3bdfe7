//! Static parameter catalog for one planning day.
//!
//! Holds the tour table, the truck- and charger-type tables and the site
//! constants (grid connection, stationary storage, economics). Everything in
//! here is fixed input: the model builder reads it, the solver decides, and
//! nothing is mutated after the solve.
//!
//! The catalog is validated as a whole before any constraint is generated; a
//! missing or inconsistent entry is a fatal configuration error.

use crate::error::{PlanError, PlanResult};
use crate::timegrid::{Interval, TimeGrid};
use crate::units::{Kilometers, KilowattHours, Kilowatts};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Unique identifier for a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TourId(pub usize);

impl TourId {
    pub fn new(id: usize) -> Self {
        TourId(id)
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

/// Unique identifier for a truck type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TruckTypeId(pub usize);

impl TruckTypeId {
    pub fn new(id: usize) -> Self {
        TruckTypeId(id)
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

/// Unique identifier for a charger type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChargerTypeId(pub usize);

impl ChargerTypeId {
    pub fn new(id: usize) -> Self {
        ChargerTypeId(id)
    }

    pub fn value(&self) -> usize {
        self.0
    }
}

/// A fixed-time, fixed-distance trip that must be covered by exactly one
/// truck on the planning day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    pub id: TourId,
    /// Human-readable name, e.g. "w3"
    pub name: String,
    /// Total driving distance
    pub distance: Kilometers,
    /// Toll-liable share of the distance
    pub toll_distance: Kilometers,
    /// Departure interval (inclusive)
    pub start: Interval,
    /// Arrival interval (exclusive for activity purposes)
    pub end: Interval,
}

impl Tour {
    /// Tour length in intervals; tours never wrap across the day boundary.
    pub fn duration_intervals(&self) -> usize {
        self.end - self.start
    }
}

/// Drivetrain-specific data of a truck type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Powertrain {
    /// Combustion drivetrain; cannot connect to a charger.
    Diesel {
        /// Fuel consumption in litres per km
        fuel_litres_per_km: f64,
        /// Annual vehicle registration tax
        registration_tax_eur: f64,
    },
    /// Battery-electric drivetrain.
    Electric {
        /// Usable battery capacity
        battery: KilowattHours,
        /// Energy consumption per km driven
        consumption_kwh_per_km: f64,
        /// Maximum charging power the vehicle accepts
        max_charge_power: Kilowatts,
        /// Annual emissions-quota credit earned per vehicle in service
        emissions_credit_eur: f64,
    },
}

/// A catalog entry defining cost and physical characteristics shared by all
/// trucks assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruckType {
    pub id: TruckTypeId,
    pub name: String,
    /// Annualized capital cost per vehicle
    pub capital_eur: f64,
    /// Annual operating cost per vehicle
    pub operating_eur: f64,
    pub powertrain: Powertrain,
}

impl TruckType {
    pub fn is_electric(&self) -> bool {
        matches!(self.powertrain, Powertrain::Electric { .. })
    }

    pub fn is_diesel(&self) -> bool {
        !self.is_electric()
    }

    /// Battery capacity, `None` for combustion types.
    pub fn battery(&self) -> Option<KilowattHours> {
        match self.powertrain {
            Powertrain::Electric { battery, .. } => Some(battery),
            Powertrain::Diesel { .. } => None,
        }
    }

    /// Maximum charging power; zero for combustion types.
    pub fn max_charge_power(&self) -> Kilowatts {
        match self.powertrain {
            Powertrain::Electric {
                max_charge_power, ..
            } => max_charge_power,
            Powertrain::Diesel { .. } => Kilowatts::ZERO,
        }
    }

    /// Energy consumption per km; zero for combustion types.
    pub fn consumption_kwh_per_km(&self) -> f64 {
        match self.powertrain {
            Powertrain::Electric {
                consumption_kwh_per_km,
                ..
            } => consumption_kwh_per_km,
            Powertrain::Diesel { .. } => 0.0,
        }
    }

    /// Annual fixed cost charged for every vehicle of this type in service:
    /// capital + operating, plus registration tax for combustion types.
    pub fn annual_fixed_cost_eur(&self) -> f64 {
        let tax = match self.powertrain {
            Powertrain::Diesel {
                registration_tax_eur,
                ..
            } => registration_tax_eur,
            Powertrain::Electric { .. } => 0.0,
        };
        self.capital_eur + self.operating_eur + tax
    }

    /// Annual credit revenue earned per vehicle in service; zero for
    /// combustion types.
    pub fn emissions_credit_eur(&self) -> f64 {
        match self.powertrain {
            Powertrain::Electric {
                emissions_credit_eur,
                ..
            } => emissions_credit_eur,
            Powertrain::Diesel { .. } => 0.0,
        }
    }
}

/// An installable charging unit model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargerType {
    pub id: ChargerTypeId,
    pub name: String,
    /// Annualized capital cost per installed unit
    pub capital_eur: f64,
    /// Annual operating cost per installed unit
    pub operating_eur: f64,
    /// Maximum aggregate power one unit can deliver
    pub max_power: Kilowatts,
    /// Simultaneous connection points per unit
    pub connection_points: u32,
    /// Maximum units of this type that may be installed at the site
    pub max_units: u32,
}

/// The single shared grid connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConnection {
    /// Power cap of the existing connection
    pub base_capacity: Kilowatts,
    /// Extra capacity unlocked by the one-time upgrade
    pub upgrade_increment: Kilowatts,
    /// Annual cost of the upgrade if taken
    pub upgrade_cost_eur: f64,
}

impl Default for GridConnection {
    fn default() -> Self {
        Self {
            base_capacity: Kilowatts(500.0),
            upgrade_increment: Kilowatts(500.0),
            upgrade_cost_eur: 10_000.0,
        }
    }
}

/// Cost and physics of the stationary storage unit. Its power rating and
/// energy capacity are sized by the optimization, not fixed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageParams {
    /// Annualized capital cost per kW of power rating
    pub power_cost_eur_per_kw: f64,
    /// Annualized capital cost per kWh of energy capacity
    pub energy_cost_eur_per_kwh: f64,
    /// Annual operating cost as a fraction of capital cost
    pub operating_cost_fraction: f64,
    /// Round-trip efficiency, in (0, 1]
    pub round_trip_efficiency: f64,
    /// Minimum level as a fraction of capacity, in [0, 1)
    pub reserve_fraction: f64,
}

impl Default for StorageParams {
    fn default() -> Self {
        Self {
            power_cost_eur_per_kw: 30.0,
            energy_cost_eur_per_kwh: 350.0,
            operating_cost_fraction: 0.02,
            round_trip_efficiency: 0.98,
            reserve_fraction: 0.025,
        }
    }
}

/// Prices and the annualization factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Economics {
    pub diesel_eur_per_litre: f64,
    pub toll_eur_per_km: f64,
    pub electricity_eur_per_kwh: f64,
    /// Fixed annual grid connection fee
    pub grid_fee_eur: f64,
    /// Annual demand charge per kW of peak draw
    pub peak_eur_per_kw: f64,
    /// Number of days per year the daily pattern repeats
    pub operating_days_per_year: u32,
}

impl Default for Economics {
    fn default() -> Self {
        Self {
            diesel_eur_per_litre: 1.68,
            toll_eur_per_km: 0.34,
            electricity_eur_per_kwh: 0.25,
            grid_fee_eur: 1000.0,
            peak_eur_per_kw: 150.0,
            operating_days_per_year: 260,
        }
    }
}

/// The complete static input dataset for one planning day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub tours: Vec<Tour>,
    /// Upper bound on fleet size; slots left idle cost nothing.
    pub truck_slots: usize,
    pub truck_types: Vec<TruckType>,
    pub charger_types: Vec<ChargerType>,
    /// Site-wide cap on installed charger units summed across types.
    pub max_total_charger_units: u32,
    pub grid: GridConnection,
    pub storage: StorageParams,
    pub economics: Economics,
}

impl Catalog {
    /// Parse a catalog from its JSON representation. Call
    /// [`Catalog::validate`] before building a model from it.
    pub fn from_json_str(s: &str) -> PlanResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Look up a tour by id.
    pub fn tour(&self, id: TourId) -> PlanResult<&Tour> {
        self.tours
            .iter()
            .find(|t| t.id == id)
            .ok_or(PlanError::MissingEntry {
                entity: "tour",
                key: id.value().to_string(),
            })
    }

    /// Look up a truck type by id.
    pub fn truck_type(&self, id: TruckTypeId) -> PlanResult<&TruckType> {
        self.truck_types
            .iter()
            .find(|t| t.id == id)
            .ok_or(PlanError::MissingEntry {
                entity: "truck type",
                key: id.value().to_string(),
            })
    }

    /// Look up a charger type by id.
    pub fn charger_type(&self, id: ChargerTypeId) -> PlanResult<&ChargerType> {
        self.charger_types
            .iter()
            .find(|t| t.id == id)
            .ok_or(PlanError::MissingEntry {
                entity: "charger type",
                key: id.value().to_string(),
            })
    }

    /// Indices into `truck_types` of the electric types.
    pub fn electric_type_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.truck_types
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_electric())
            .map(|(i, _)| i)
    }

    /// Indices into `truck_types` of the combustion types.
    pub fn diesel_type_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.truck_types
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_diesel())
            .map(|(i, _)| i)
    }

    pub fn has_electric_types(&self) -> bool {
        self.truck_types.iter().any(|t| t.is_electric())
    }

    /// Largest battery capacity across electric types; zero when the catalog
    /// has none.
    pub fn max_battery(&self) -> KilowattHours {
        self.truck_types
            .iter()
            .filter_map(|t| t.battery())
            .fold(KilowattHours::ZERO, KilowattHours::max)
    }

    /// Check the whole dataset for consistency against `grid`.
    ///
    /// Fails fast with the first problem found; nothing is defaulted.
    pub fn validate(&self, grid: &TimeGrid) -> PlanResult<()> {
        if self.truck_types.is_empty() {
            return Err(PlanError::Catalog("no truck types declared".into()));
        }

        let mut tour_ids = HashSet::new();
        for tour in &self.tours {
            if !tour_ids.insert(tour.id) {
                return Err(PlanError::Catalog(format!(
                    "duplicate tour id {}",
                    tour.id.value()
                )));
            }
            if tour.start >= tour.end {
                return Err(PlanError::Catalog(format!(
                    "tour `{}` must start before it ends (got {}..{})",
                    tour.name, tour.start, tour.end
                )));
            }
            if !grid.contains(tour.start) || !grid.contains(tour.end) {
                return Err(PlanError::Catalog(format!(
                    "tour `{}` lies outside the day's intervals 1..={}",
                    tour.name,
                    grid.len()
                )));
            }
            if !(tour.distance.value() >= 0.0 && tour.distance.is_finite()) {
                return Err(PlanError::Catalog(format!(
                    "tour `{}` has invalid distance {}",
                    tour.name, tour.distance
                )));
            }
            if tour.toll_distance.value() < 0.0 || tour.toll_distance > tour.distance {
                return Err(PlanError::Catalog(format!(
                    "tour `{}` toll distance {} exceeds its distance {}",
                    tour.name, tour.toll_distance, tour.distance
                )));
            }
        }

        let mut type_ids = HashSet::new();
        for ty in &self.truck_types {
            if !type_ids.insert(ty.id) {
                return Err(PlanError::Catalog(format!(
                    "duplicate truck type id {}",
                    ty.id.value()
                )));
            }
            if ty.capital_eur < 0.0 || ty.operating_eur < 0.0 {
                return Err(PlanError::Catalog(format!(
                    "truck type `{}` has negative fixed costs",
                    ty.name
                )));
            }
            match &ty.powertrain {
                Powertrain::Diesel {
                    fuel_litres_per_km,
                    registration_tax_eur,
                } => {
                    if *fuel_litres_per_km < 0.0 || *registration_tax_eur < 0.0 {
                        return Err(PlanError::Catalog(format!(
                            "diesel type `{}` has negative consumption or tax",
                            ty.name
                        )));
                    }
                }
                Powertrain::Electric {
                    battery,
                    consumption_kwh_per_km,
                    max_charge_power,
                    emissions_credit_eur,
                } => {
                    if battery.value() <= 0.0 {
                        return Err(PlanError::Catalog(format!(
                            "electric type `{}` needs a positive battery capacity",
                            ty.name
                        )));
                    }
                    if *consumption_kwh_per_km < 0.0
                        || max_charge_power.value() < 0.0
                        || *emissions_credit_eur < 0.0
                    {
                        return Err(PlanError::Catalog(format!(
                            "electric type `{}` has a negative parameter",
                            ty.name
                        )));
                    }
                }
            }
        }

        let mut charger_ids = HashSet::new();
        for charger in &self.charger_types {
            if !charger_ids.insert(charger.id) {
                return Err(PlanError::Catalog(format!(
                    "duplicate charger type id {}",
                    charger.id.value()
                )));
            }
            if charger.connection_points == 0 {
                return Err(PlanError::Catalog(format!(
                    "charger type `{}` needs at least one connection point",
                    charger.name
                )));
            }
            if charger.max_power.value() <= 0.0 {
                return Err(PlanError::Catalog(format!(
                    "charger type `{}` needs positive rated power",
                    charger.name
                )));
            }
            if charger.capital_eur < 0.0 || charger.operating_eur < 0.0 {
                return Err(PlanError::Catalog(format!(
                    "charger type `{}` has negative costs",
                    charger.name
                )));
            }
        }

        if self.grid.base_capacity.value() < 0.0
            || self.grid.upgrade_increment.value() < 0.0
            || self.grid.upgrade_cost_eur < 0.0
        {
            return Err(PlanError::Catalog(
                "grid connection parameters must be non-negative".into(),
            ));
        }

        let s = &self.storage;
        if !(s.round_trip_efficiency > 0.0 && s.round_trip_efficiency <= 1.0) {
            return Err(PlanError::Catalog(format!(
                "storage round-trip efficiency must lie in (0, 1], got {}",
                s.round_trip_efficiency
            )));
        }
        if !(0.0..1.0).contains(&s.reserve_fraction) {
            return Err(PlanError::Catalog(format!(
                "storage reserve fraction must lie in [0, 1), got {}",
                s.reserve_fraction
            )));
        }
        if s.power_cost_eur_per_kw < 0.0
            || s.energy_cost_eur_per_kwh < 0.0
            || s.operating_cost_fraction < 0.0
        {
            return Err(PlanError::Catalog(
                "storage costs must be non-negative".into(),
            ));
        }

        let e = &self.economics;
        if e.operating_days_per_year == 0 {
            return Err(PlanError::Catalog(
                "operating days per year must be at least 1".into(),
            ));
        }
        if e.diesel_eur_per_litre < 0.0
            || e.toll_eur_per_km < 0.0
            || e.electricity_eur_per_kwh < 0.0
            || e.grid_fee_eur < 0.0
            || e.peak_eur_per_kw < 0.0
        {
            return Err(PlanError::Catalog("prices must be non-negative".into()));
        }

        Ok(())
    }
}
