// Copyright (c) 2024 The filedrop developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use std::process;

use log::{error, info, Log};

use filedrop::config::Config;
use filedrop::log::Logger;
use filedrop::save;
use filedrop::{Server, UploadService};

fn main() {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(err) => {
            eprintln!("Invalid configuration: {}", err);
            process::exit(2);
        }
    };

    let mut logger = Logger::new(config.log_level);
    if let Some(ref path) = config.log_file {
        logger = match logger.with_file(path) {
            Ok(l) => l,
            Err(err) => {
                eprintln!("Could not open the log file {}: {}", path.display(), err);
                process::exit(1);
            }
        };
    }

    if let Err(err) = logger.init() {
        eprintln!("Could not install the logger: {}", err);
        process::exit(1);
    }

    match save::ensure_dir(&config.upload_dir) {
        Ok(true) => info!("Created directory: {}", config.upload_dir.display()),
        Ok(false) => info!("Directory already exists: {}", config.upload_dir.display()),
        Err(err) => {
            error!("Could not create directory {}: {}", config.upload_dir.display(), err);
            process::exit(1);
        }
    }

    let shutdown = ctrlc::set_handler(|| {
        info!("Server stopped by keyboard interrupt.");
        println!("\nServer stopped.");
        ::log::logger().flush();
        process::exit(0);
    });

    if let Err(err) = shutdown {
        error!("Could not install the Ctrl-C handler: {}", err);
    }

    let service = UploadService::new(&config);
    let server = match Server::new(config.addr(), move |request| service.handle(request)) {
        Ok(s) => s,
        Err(err) => {
            error!("Could not listen on {}: {}", config.addr(), err);
            process::exit(1);
        }
    };

    info!("Server started on port {}", config.port);
    println!("Server started on port {}", config.port);

    server.run();
}
