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

//! Operations on the collection of rides.

use crate::db;
use crate::driver::Driver;
use crate::model::*;
use rides_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Gets the window of rides described by `pagination`.
    ///
    /// A window with no rides in it is reported as not found.
    pub(crate) async fn get_rides(self, pagination: Pagination) -> DriverResult<Vec<Ride>> {
        let rides = db::get_rides(&mut self.db.ex().await?, pagination).await?;
        if rides.is_empty() {
            return Err(DriverError::NotFound("Could not find any rides".to_owned()));
        }
        Ok(rides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use crate::model::testutils::*;
    use time::macros::datetime;

    #[tokio::test]
    async fn test_get_rides_none() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("Could not find any rides".to_owned()),
            context.driver().get_rides(Pagination::new(1, 10).unwrap()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_get_rides_some() {
        let context = TestContext::setup().await;

        let created = datetime!(2023-10-16 08:30:15 UTC);
        let id1 = context.put_ride(new_ride("Alice", "Bob", "Civic"), created).await;
        let id2 = context.put_ride(new_ride("Carol", "Dave", "Model 3"), created).await;

        let rides = context.driver().get_rides(Pagination::new(1, 10).unwrap()).await.unwrap();
        assert_eq!(
            vec![
                Ride::new(id1, new_ride("Alice", "Bob", "Civic"), created),
                Ride::new(id2, new_ride("Carol", "Dave", "Model 3"), created),
            ],
            rides
        );
    }

    #[tokio::test]
    async fn test_get_rides_past_the_end() {
        let context = TestContext::setup().await;

        let created = datetime!(2023-10-16 08:30:15 UTC);
        for _ in 0..3 {
            context.put_ride(new_ride("Alice", "Bob", "Civic"), created).await;
        }

        let rides = context.driver().get_rides(Pagination::new(2, 2).unwrap()).await.unwrap();
        assert_eq!(1, rides.len());
        assert_eq!(3, rides[0].id().as_i64());

        assert_eq!(
            DriverError::NotFound("Could not find any rides".to_owned()),
            context.driver().get_rides(Pagination::new(3, 2).unwrap()).await.unwrap_err()
        );
    }
}
