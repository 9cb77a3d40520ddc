// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! High-level data types.

use derive_getters::Getters;
use derive_more::{Constructor, Display};
use rides_core::model::{ModelError, ModelResult};
use serde::de::{DeserializeOwned, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use time::OffsetDateTime;

/// Generates a newtype for a geographic coordinate that only holds values within the
/// `[$min, $max]` range of degrees.
macro_rules! coordinate_type [
    ( $name:ident, $what:literal, $min:expr, $max:expr ) => {
        #[doc = concat!("A ", $what, " expressed in degrees, guaranteed to be in range.")]
        #[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
        #[serde(transparent)]
        pub(crate) struct $name(f64);

        impl $name {
            #[doc = concat!("Creates a new ", $what, " from untrusted `degrees`.")]
            pub(crate) fn new(degrees: f64) -> ModelResult<Self> {
                if !($min..=$max).contains(&degrees) {
                    return Err(ModelError(format!(
                        "{} must be between {} and {} degrees but got {}",
                        $what, $min, $max, degrees
                    )));
                }
                Ok(Self(degrees))
            }

            #[doc = concat!("Returns the ", $what, " in degrees.")]
            pub(crate) fn as_f64(&self) -> f64 {
                self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let degrees = f64::deserialize(deserializer)?;
                $name::new(degrees).map_err(serde::de::Error::custom)
            }
        }
    }
];

coordinate_type!(Latitude, "Latitude", -90.0, 90.0);
coordinate_type!(Longitude, "Longitude", -180.0, 180.0);

/// A non-empty piece of text naming a person or a vehicle.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct Name(String);

impl Name {
    /// Creates a new name from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(ModelError("Name cannot be empty".to_owned()));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the name.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
impl From<&'static str> for Name {
    /// Creates a new name from a hardcoded string, which must be valid.
    fn from(name: &'static str) -> Self {
        Name::new(name).expect("Hardcoded names must be valid")
    }
}

/// A deserialization visitor for a `Name`.
struct NameVisitor;

impl Visitor<'_> for NameVisitor {
    type Value = Name;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a non-empty string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Name::new(v).map_err(|e| E::custom(e.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Name::new(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_string(NameVisitor)
    }
}

/// Identifier of a ride.  Assigned by the database on insertion and always positive.
#[derive(Clone, Copy, Debug, Display, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
#[serde(transparent)]
pub(crate) struct RideId(i64);

impl RideId {
    /// Creates a ride identifier from an `i64` with range validation.
    pub(crate) fn new(id: i64) -> ModelResult<Self> {
        if id < 1 {
            return Err(ModelError(format!("Ride ID must be positive but got {}", id)));
        }
        Ok(Self(id))
    }

    /// Returns the identifier as an `i64`.
    pub(crate) fn as_i64(&self) -> i64 {
        self.0
    }
}

impl FromStr for RideId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<i64>() {
            Ok(id) => RideId::new(id),
            Err(e) => Err(ModelError(format!("Invalid ride ID '{}': {}", s, e))),
        }
    }
}

/// Extracts the field `name` from a raw JSON `object` and converts it to `T`.
fn get_field<T: DeserializeOwned>(object: &Map<String, Value>, name: &str) -> ModelResult<T> {
    match object.get(name) {
        Some(value) => {
            T::deserialize(value).map_err(|e| ModelError(format!("Invalid {}: {}", name, e)))
        }
        None => Err(ModelError(format!("Missing required field {}", name))),
    }
}

/// The contents of a ride as submitted by a client, before it is stored.
#[derive(Constructor, Debug, Getters, PartialEq)]
pub(crate) struct NewRide {
    /// Pickup latitude.
    start_lat: Latitude,

    /// Pickup longitude.
    start_long: Longitude,

    /// Dropoff latitude.
    end_lat: Latitude,

    /// Dropoff longitude.
    end_long: Longitude,

    /// Name of the person who took the ride.
    rider_name: Name,

    /// Name of the person who drove.
    driver_name: Name,

    /// Vehicle the ride happened in.
    driver_vehicle: Name,
}

impl NewRide {
    /// Validates an untrusted `payload` and converts it into a ride.
    ///
    /// Fields are checked one at a time in a fixed order and the first one that fails is the one
    /// reported.  Unknown fields are ignored.
    pub(crate) fn from_json(payload: &Value) -> ModelResult<Self> {
        let object = match payload.as_object() {
            Some(object) => object,
            None => return Err(ModelError("Ride must be a JSON object".to_owned())),
        };

        Ok(Self {
            start_lat: get_field(object, "start_lat")?,
            start_long: get_field(object, "start_long")?,
            end_lat: get_field(object, "end_lat")?,
            end_long: get_field(object, "end_long")?,
            rider_name: get_field(object, "rider_name")?,
            driver_name: get_field(object, "driver_name")?,
            driver_vehicle: get_field(object, "driver_vehicle")?,
        })
    }
}

/// A ride as stored in the database.
#[derive(Debug, Getters, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
#[serde(rename_all = "camelCase")]
pub(crate) struct Ride {
    /// Identifier of the ride, which also determines the order in which rides are listed.
    #[serde(rename = "rideID")]
    id: RideId,

    /// Pickup latitude.
    start_lat: Latitude,

    /// Pickup longitude.
    start_long: Longitude,

    /// Dropoff latitude.
    end_lat: Latitude,

    /// Dropoff longitude.
    end_long: Longitude,

    /// Name of the person who took the ride.
    rider_name: Name,

    /// Name of the person who drove.
    driver_name: Name,

    /// Vehicle the ride happened in.
    driver_vehicle: Name,

    /// Time at which the ride was recorded.
    #[serde(with = "time::serde::rfc3339")]
    created: OffsetDateTime,
}

impl Ride {
    /// Creates a stored ride from the `ride` contents, the `id` the database assigned to it and
    /// its `created` timestamp.
    pub(crate) fn new(id: RideId, ride: NewRide, created: OffsetDateTime) -> Self {
        Self {
            id,
            start_lat: ride.start_lat,
            start_long: ride.start_long,
            end_lat: ride.end_lat,
            end_long: ride.end_long,
            rider_name: ride.rider_name,
            driver_name: ride.driver_name,
            driver_vehicle: ride.driver_vehicle,
            created,
        }
    }
}

/// Window over the list of rides, in `rideID` order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Pagination {
    /// 1-indexed page number.
    page: i64,

    /// Maximum number of rides per page.
    limit: i64,
}

impl Pagination {
    /// Creates a new window from the untrusted `page` and `limit` values.
    pub(crate) fn new(page: i64, limit: i64) -> ModelResult<Self> {
        if page < 1 {
            return Err(ModelError(format!("page must be a positive integer but got {}", page)));
        }
        if limit < 1 {
            return Err(ModelError(format!("limit must be a positive integer but got {}", limit)));
        }
        if (page - 1).checked_mul(limit).is_none() {
            return Err(ModelError(format!("page {} with limit {} is out of range", page, limit)));
        }
        Ok(Self { page, limit })
    }

    /// Returns the number of rides to skip before this page.
    pub(crate) fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Returns the maximum number of rides in this page.
    pub(crate) fn limit(&self) -> i64 {
        self.limit
    }
}
