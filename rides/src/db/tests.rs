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

//! Database tests shared by all implementations.

use crate::db::*;
use crate::model::testutils::*;
use rides_core::db::{Db, DbError, Executor};
use std::sync::Arc;
use time::OffsetDateTime;
use time::macros::datetime;

/// Stores a ride for `rider_name` at time `created` and returns its identifier.
async fn put_test_ride(
    ex: &mut Executor,
    rider_name: &'static str,
    created: OffsetDateTime,
) -> RideId {
    put_ride(ex, &new_ride(rider_name, "Bob", "Civic"), created).await.unwrap()
}

/// Gets the identifiers of the rides in the window described by `page` and `limit`.
async fn get_ride_ids(ex: &mut Executor, page: i64, limit: i64) -> Vec<RideId> {
    get_rides(ex, Pagination::new(page, limit).unwrap())
        .await
        .unwrap()
        .into_iter()
        .map(|ride| *ride.id())
        .collect()
}

pub(crate) async fn test_put_and_get_ride(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();

    let created = datetime!(2023-10-16 08:30:15.123456 UTC);
    let id = put_ride(&mut ex, &new_ride("Alice", "Bob", "Civic"), created).await.unwrap();

    let ride = get_ride(&mut ex, id).await.unwrap();
    assert_eq!(Ride::new(id, new_ride("Alice", "Bob", "Civic"), created), ride);

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_put_ride_assigns_increasing_ids(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();

    let created = datetime!(2023-10-16 08:30:15 UTC);
    let id1 = put_test_ride(&mut ex, "first", created).await;
    let id2 = put_test_ride(&mut ex, "second", created).await;
    let id3 = put_test_ride(&mut ex, "third", created).await;
    assert_eq!(1, id1.as_i64());
    assert!(id1 < id2);
    assert!(id2 < id3);

    assert_eq!(&Name::from("second"), get_ride(&mut ex, id2).await.unwrap().rider_name());

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_get_ride_not_found(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();

    let id = put_test_ride(&mut ex, "Alice", datetime!(2023-10-16 08:30:15 UTC)).await;
    let missing = RideId::new(id.as_i64() + 1).unwrap();
    assert_eq!(DbError::NotFound, get_ride(&mut ex, missing).await.unwrap_err());

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_get_rides_empty(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();

    let rides = get_rides(&mut ex, Pagination::new(1, 10).unwrap()).await.unwrap();
    assert!(rides.is_empty());

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_get_rides_pagination(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();

    let created = datetime!(2023-10-16 08:30:15 UTC);
    let mut ids = vec![];
    for rider_name in ["one", "two", "three", "four", "five"] {
        ids.push(put_test_ride(&mut ex, rider_name, created).await);
    }

    assert_eq!(ids[0..2], get_ride_ids(&mut ex, 1, 2).await);
    assert_eq!(ids[2..4], get_ride_ids(&mut ex, 2, 2).await);
    assert_eq!(ids[4..5], get_ride_ids(&mut ex, 3, 2).await);
    assert!(get_ride_ids(&mut ex, 4, 2).await.is_empty());
    assert_eq!(ids, get_ride_ids(&mut ex, 1, 100).await);
    assert_eq!(ids[3..4], get_ride_ids(&mut ex, 4, 1).await);

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_get_rides_returns_full_rides(db: Arc<dyn Db + Send + Sync>) {
    let mut ex = db.ex().await.unwrap();

    let created1 = datetime!(2023-10-16 08:30:15 UTC);
    let created2 = datetime!(2023-10-17 10:00:00.5 UTC);
    let id1 = put_ride(&mut ex, &new_ride("Alice", "Bob", "Civic"), created1).await.unwrap();
    let id2 = put_ride(&mut ex, &new_ride("Carol", "Dave", "Model 3"), created2).await.unwrap();

    let rides = get_rides(&mut ex, Pagination::new(1, 10).unwrap()).await.unwrap();
    assert_eq!(
        vec![
            Ride::new(id1, new_ride("Alice", "Bob", "Civic"), created1),
            Ride::new(id2, new_ride("Carol", "Dave", "Model 3"), created2),
        ],
        rides
    );

    drop(ex);
    db.close().await;
}

#[test]
fn test_ensure_one_insert() {
    ensure_one_insert(1).unwrap();
    assert_eq!(
        DbError::BackendError("Insertion affected 0 rows instead of 1".to_owned()),
        ensure_one_insert(0).unwrap_err()
    );
    assert_eq!(
        DbError::BackendError("Insertion affected 2 rows instead of 1".to_owned()),
        ensure_one_insert(2).unwrap_err()
    );
}

/// Instantiates the shared storage tests against the database returned by `setup`.
#[macro_export]
macro_rules! generate_db_tests [
    ( $setup:expr $(, #[$extra:meta])? ) => {
        rides_core::db::testutils::generate_tests!(
            $( #[$extra], )?
            $setup,
            $crate::db::tests,
            test_put_and_get_ride,
            test_put_ride_assigns_increasing_ids,
            test_get_ride_not_found,
            test_get_rides_empty,
            test_get_rides_pagination,
            test_get_rides_returns_full_rides
        );
    }
];

mod sqlite {
    use super::*;
    use rides_core::db::sqlite::testutils::setup;

    /// Creates an in-memory SQLite database with the schema of the service.
    async fn setup_with_schema() -> Arc<dyn Db + Send + Sync> {
        let db = Arc::new(setup().await);
        init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        db
    }

    generate_db_tests!(setup_with_schema().await);
}
