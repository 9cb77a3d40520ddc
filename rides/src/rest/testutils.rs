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

//! Test utilities for the REST API.

use crate::db;
use crate::driver::Driver;
use crate::model::*;
use crate::rest::app;
use axum::Router;
use rides_core::clocks::testutils::SettableClock;
use rides_core::db::Db;
use rides_core::db::sqlite::testutils::setup;
use std::sync::Arc;
use time::OffsetDateTime;
use time::macros::datetime;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the app, for out of band inspection.
    db: Arc<dyn Db + Send + Sync>,

    /// The app under test.
    app: Router,
}

impl TestContext {
    /// Initializes the app against an empty in-memory database with a fixed clock.
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> = Arc::new(setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let clock = Arc::new(SettableClock::new(datetime!(2023-10-16 08:30:15 UTC)));
        let driver = Driver::new(db.clone(), clock);
        let app = app(driver);
        Self { db, app }
    }

    /// Returns a copy of the app under test.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns the app under test.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Stores `ride` directly in the database, bypassing the app.
    pub(crate) async fn put_ride(&self, ride: NewRide, created: OffsetDateTime) -> RideId {
        db::put_ride(&mut self.db.ex().await.unwrap(), &ride, created).await.unwrap()
    }

    /// Gets the ride `id` directly from the database.
    pub(crate) async fn get_ride(&self, id: RideId) -> Ride {
        db::get_ride(&mut self.db.ex().await.unwrap(), id).await.unwrap()
    }

    /// Counts the rides in the database.
    pub(crate) async fn count_rides(&self) -> usize {
        let pagination = Pagination::new(1, i64::MAX).unwrap();
        db::get_rides(&mut self.db.ex().await.unwrap(), pagination).await.unwrap().len()
    }
}
