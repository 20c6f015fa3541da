use {
    std::{env, path::PathBuf, process},
    log::{error, info, warn},
    tidepool::{
        config::{self, Config},
        logger::{self, Level},
        Method, Req, Res, Server,
    },
};

const LOG_BUFFER_SIZE: usize = 64;

fn main() {
    let path = env::args_os().nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_FILE));
    let mut cfg = match Config::load_or_default(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        },
    };

    let level = cfg.log_level();
    if let Err(e) = logger::init_stdout_logger(LOG_BUFFER_SIZE, level.unwrap_or(Level::Info)) {
        eprintln!("failed to set up logging: {}", e);
    }
    if level.is_none() {
        warn!("unknown log_level '{}'. using info", cfg.log_level);
    }
    cfg.apply_env();
    info!("# of CPU: {}, max lines: {}", num_cpus::get(), cfg.max_workers());

    let mut s = match Server::new(cfg) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        },
    };
    set_up_server_handlers(&mut s);

    if let Err(e) = s.start() {
        error!("{}", e);
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn set_up_server_handlers(server: &mut Server) {
    server.add(Method::GET, "/api/sum", |_: &Req| {
        let mut res = Res::new();
        res.set_json_content_type().set_body(r#"{"sum": "unknown"}"#);
        res
    });
    server.add(Method::GET, "/api/sum/:val1/:val2", sum);
}

fn sum(req: &Req) -> Res {
    let operand = |name: &str| req.path_var(name).and_then(|v| v.parse::<i64>().ok());
    let mut res = Res::new();
    match (operand("val1"), operand("val2")) {
        (Some(a), Some(b)) => {
            res.set_json_content_type()
                .set_body(&format!(r#"{{"sum": {}}}"#, a.wrapping_add(b)));
        },
        _ => {
            res.set_code(400)
                .set_body("both operands must be integers");
        },
    }
    res
}
