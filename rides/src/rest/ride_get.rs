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

//! API to get a single ride.

use crate::driver::Driver;
use crate::model::RideId;
use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use rides_core::rest::{EmptyBody, RestError};

/// API handler.
///
/// Identifiers that cannot possibly name a ride are reported as not found.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let id = id
        .parse::<RideId>()
        .map_err(|_| RestError::NotFound(format!("Could not find ride {}", id)))?;
    let ride = driver.get_ride(id).await?;

    Ok(Json(ride))
}
