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

//! Database abstraction in terms of the operations needed by the server.

use crate::model::*;
use futures::TryStreamExt;
use rides_core::db::sqlite::{self, build_timestamp, unpack_timestamp};
use rides_core::db::{DbError, DbResult, Executor};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use time::OffsetDateTime;

#[cfg(test)]
mod tests;

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,
    }
}

/// Checks that an insertion of a single entity touched exactly one row.
fn ensure_one_insert(rows_affected: u64) -> DbResult<()> {
    if rows_affected != 1 {
        return Err(DbError::BackendError(format!(
            "Insertion affected {} rows instead of 1",
            rows_affected
        )));
    }
    Ok(())
}

/// Converts a `row` from the `rides` table into a ride.
fn sqlite_row_to_ride(row: SqliteRow) -> DbResult<Ride> {
    let ride_id: i64 = row.try_get("ride_id").map_err(sqlite::map_sqlx_error)?;
    let start_lat: f64 = row.try_get("start_lat").map_err(sqlite::map_sqlx_error)?;
    let start_long: f64 = row.try_get("start_long").map_err(sqlite::map_sqlx_error)?;
    let end_lat: f64 = row.try_get("end_lat").map_err(sqlite::map_sqlx_error)?;
    let end_long: f64 = row.try_get("end_long").map_err(sqlite::map_sqlx_error)?;
    let rider_name: String = row.try_get("rider_name").map_err(sqlite::map_sqlx_error)?;
    let driver_name: String = row.try_get("driver_name").map_err(sqlite::map_sqlx_error)?;
    let driver_vehicle: String = row.try_get("driver_vehicle").map_err(sqlite::map_sqlx_error)?;
    let created_sec: i64 = row.try_get("created_sec").map_err(sqlite::map_sqlx_error)?;
    let created_nsec: i64 = row.try_get("created_nsec").map_err(sqlite::map_sqlx_error)?;

    let ride = NewRide::new(
        Latitude::new(start_lat)?,
        Longitude::new(start_long)?,
        Latitude::new(end_lat)?,
        Longitude::new(end_long)?,
        Name::new(rider_name)?,
        Name::new(driver_name)?,
        Name::new(driver_vehicle)?,
    );
    let created = build_timestamp(created_sec, created_nsec)?;
    Ok(Ride::new(RideId::new(ride_id)?, ride, created))
}

/// Gets the ride identified by `id`.
pub(crate) async fn get_ride(ex: &mut Executor, id: RideId) -> DbResult<Ride> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT ride_id, start_lat, start_long, end_lat, end_long,
                    rider_name, driver_name, driver_vehicle, created_sec, created_nsec
                FROM rides
                WHERE ride_id = ?
            ";
            let row = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            sqlite_row_to_ride(row)
        }
    }
}

/// Gets the window of rides described by `pagination`, sorted by their identifiers.
///
/// Returns an empty list if the window falls past the last ride.
pub(crate) async fn get_rides(ex: &mut Executor, pagination: Pagination) -> DbResult<Vec<Ride>> {
    let mut rides = vec![];
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT ride_id, start_lat, start_long, end_lat, end_long,
                    rider_name, driver_name, driver_vehicle, created_sec, created_nsec
                FROM rides
                ORDER BY ride_id
                LIMIT ? OFFSET ?
            ";
            let mut rows = sqlx::query(query_str)
                .bind(pagination.limit())
                .bind(pagination.offset())
                .fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
                rides.push(sqlite_row_to_ride(row)?);
            }
        }
    }
    Ok(rides)
}

/// Stores a new `ride` created at time `created` and returns the identifier assigned to it.
pub(crate) async fn put_ride(
    ex: &mut Executor,
    ride: &NewRide,
    created: OffsetDateTime,
) -> DbResult<RideId> {
    match ex {
        Executor::Sqlite(ex) => {
            let (created_sec, created_nsec) = unpack_timestamp(created)?;

            let query_str = "
                INSERT INTO rides (
                    start_lat, start_long, end_lat, end_long,
                    rider_name, driver_name, driver_vehicle, created_sec, created_nsec
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ";
            let done = sqlx::query(query_str)
                .bind(ride.start_lat().as_f64())
                .bind(ride.start_long().as_f64())
                .bind(ride.end_lat().as_f64())
                .bind(ride.end_long().as_f64())
                .bind(ride.rider_name().as_str())
                .bind(ride.driver_name().as_str())
                .bind(ride.driver_vehicle().as_str())
                .bind(created_sec)
                .bind(created_nsec)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            ensure_one_insert(done.rows_affected())?;
            Ok(RideId::new(done.last_insert_rowid())?)
        }
    }
}
