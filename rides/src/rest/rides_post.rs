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

//! API to create a ride.

use crate::driver::Driver;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use axum::{Json, http};
use rides_core::rest::RestError;
use serde_json::Value;

/// API handler.
///
/// The payload is taken as raw JSON so that type mismatches in its fields are reported as
/// validation errors and not as extraction failures.  Bodies that are not JSON at all are
/// validation errors too.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, RestError> {
    let Json(payload) = payload.map_err(|e| RestError::InvalidRequest(e.body_text()))?;
    let ride = driver.create_ride(&payload).await?;

    Ok((http::StatusCode::CREATED, Json(vec![ride])))
}
