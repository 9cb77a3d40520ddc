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

//! Entry point to the rides service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use rides::db::init_schema;
use rides::serve;
use rides_core::db::Db;
use rides_core::db::sqlite::{SqliteOptions, connect_with};
use rides_core::env::get_optional_var;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Port to listen on when `RIDES_PORT` is not set.
const DEFAULT_PORT: u16 = 8010;

#[tokio::main]
async fn main() {
    env_logger::init();

    let port = get_optional_var::<u16>("RIDES", "PORT").unwrap().unwrap_or(DEFAULT_PORT);
    let addr = (Ipv4Addr::LOCALHOST, port);

    let db_opts = SqliteOptions::from_env("RIDES").unwrap();
    let db = Arc::new(connect_with(db_opts).await.unwrap());
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();

    serve(addr, db).await.unwrap()
}
