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

//! Operations on one ride.

use crate::db;
use crate::driver::Driver;
use crate::model::*;
use log::info;
use rides_core::db::DbError;
use rides_core::driver::{DriverError, DriverResult};
use serde_json::Value;

impl Driver {
    /// Validates the untrusted `payload` and, if valid, stores it as a new ride.
    ///
    /// Nothing is written to the database when validation fails.
    pub(crate) async fn create_ride(self, payload: &Value) -> DriverResult<Ride> {
        let ride = NewRide::from_json(payload)?;
        let created = self.clock.now_utc();

        let id = db::put_ride(&mut self.db.ex().await?, &ride, created).await?;
        info!("Created ride {} for rider {}", id, ride.rider_name().as_str());

        Ok(Ride::new(id, ride, created))
    }

    /// Gets the ride identified by `id`.
    pub(crate) async fn get_ride(self, id: RideId) -> DriverResult<Ride> {
        match db::get_ride(&mut self.db.ex().await?, id).await {
            Ok(ride) => Ok(ride),
            Err(DbError::NotFound) => {
                Err(DriverError::NotFound(format!("Could not find ride {}", id)))
            }
            Err(e) => Err(e.into()),
        }
    }
}
