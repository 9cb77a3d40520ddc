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

//! API to list rides, one page at a time.

use crate::driver::Driver;
use crate::model::Pagination;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use rides_core::rest::{EmptyBody, RestError};
use serde::Deserialize;

/// Query parameters of the API.
///
/// Both parameters are required but are declared as optional so that their absence can be
/// reported with a descriptive message.
#[derive(Deserialize)]
#[cfg_attr(test, derive(serde::Serialize))]
pub(crate) struct RidesQuery {
    /// 1-indexed page to return.
    page: Option<i64>,

    /// Maximum number of rides to return.
    limit: Option<i64>,
}

impl RidesQuery {
    /// Converts the raw parameters into a validated window.
    fn into_pagination(self) -> Result<Pagination, RestError> {
        let page = self.page.ok_or_else(|| {
            RestError::InvalidRequest("Missing required query parameter page".to_owned())
        })?;
        let limit = self.limit.ok_or_else(|| {
            RestError::InvalidRequest("Missing required query parameter limit".to_owned())
        })?;
        Ok(Pagination::new(page, limit)?)
    }
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    query: Result<Query<RidesQuery>, QueryRejection>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let Query(query) = query.map_err(|e| RestError::InvalidRequest(e.body_text()))?;
    let rides = driver.get_rides(query.into_pagination()?).await?;

    Ok(Json(rides))
}
