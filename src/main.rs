// Copyright 2020 - present Alex Dukhno
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! opens a directory node against a working directory and reports what it
//! finds: the suffix, the entry count and the loaded schema. Wire
//! protocols sit in front of the library crate; this binary is the local
//! inspection tool.

use ditdb::{parse_filter, DirectoryConfig, DirectoryNode, SearchRequest, SearchScope};
use simple_logger::SimpleLogger;
use std::path::PathBuf;

fn main() {
    if SimpleLogger::new().with_level(log::LevelFilter::Info).init().is_err() {
        eprintln!("logger is already initialised");
    }

    let mut args = std::env::args().skip(1);
    let working_dir = match args.next() {
        Some(dir) => PathBuf::from(dir),
        None => {
            eprintln!("usage: ditdb <working-dir> [suffix]");
            std::process::exit(2);
        }
    };
    let suffix = args.next().unwrap_or_else(|| "ou=system".to_owned());

    let config = DirectoryConfig {
        working_dir: Some(working_dir),
        suffix: suffix.clone(),
        ..DirectoryConfig::default()
    };
    let node = match DirectoryNode::open(config) {
        Ok(node) => node,
        Err(error) => {
            log::error!("failed to open directory node: {}", error);
            std::process::exit(1);
        }
    };

    let filter = match parse_filter("(objectClass=*)") {
        Ok(filter) => filter,
        Err(error) => {
            log::error!("{}", error);
            std::process::exit(1);
        }
    };
    let request = SearchRequest::new(suffix.clone(), SearchScope::Subtree, filter);
    match node.search(request) {
        Ok(results) => {
            let mut count = 0usize;
            for result in results {
                match result {
                    Ok(found) => {
                        log::info!("{}", found.dn);
                        count += 1;
                    }
                    Err(error) => {
                        log::error!("walk failed: {}", error);
                        std::process::exit(1);
                    }
                }
            }
            log::info!("{} entries under {}", count, suffix);
        }
        Err(error) => {
            log::error!("search failed: {}", error);
            std::process::exit(1);
        }
    }
}
