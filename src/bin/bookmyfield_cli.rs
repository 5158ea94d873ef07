//!
//! BookMyField console
//! -------------------
//! Command-line front end over the client core. It plays the role of the dashboard UI:
//! keeps the session in a JSON file, applies the admin/user route guards, prints results
//! as JSON and renders failures as one-line toasts.

use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

use bookmyfield::api::models::FieldRequest;
use bookmyfield::api::{Api, FieldFilters};
use bookmyfield::client::RequestClient;
use bookmyfield::config::Config;
use bookmyfield::error::{ApiError, ApiResult};
use bookmyfield::identity::{JsonFileStorage, Navigator, Role, Route, SessionGuard, TokenStore};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--base <url>] [--session <file>] <command> [args]\n\nCommands:\n  login <email> <password>                        sign in and store the session\n  register <name> <email> <password>              create an account\n  logout                                          revoke the refresh token and clear the session\n  whoami                                          show the stored role\n  refresh                                         exchange the refresh token for a new pair\n  fields [--location <l>] [--min-price <n>] [--max-price <n>]\n  field <id>\n  field-create <name> <location> <price>          (admin)\n  field-update <id> <name> <location> <price>     (admin)\n  field-delete <id>                               (admin)\n  bookings [--all]                                own bookings; --all lists every booking (admin)\n  book <field_id> <start_rfc3339> <end_rfc3339>   (user)\n  cancel <booking_id>                             (user)\n  pay <booking_id>                                start a checkout session (user)\n\nEnvironment:\n  BOOKMYFIELD_API_BASE_URL, BOOKMYFIELD_TIMEOUT_MS, BOOKMYFIELD_SESSION_FILE, RUST_LOG"
    );
}

/// Prints where the dashboard would have navigated.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: Route) {
        println!("-> {}", route.path());
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Toast-style rendering. Returns the process exit code.
fn report(err: &ApiError) -> i32 {
    match err.toast_message() {
        Some(msg) => {
            eprintln!("x {}", msg);
            1
        }
        None => 0,
    }
}

fn arg<'a>(rest: &'a [String], idx: usize, name: &str) -> Result<&'a str> {
    rest.get(idx).map(|s| s.as_str()).ok_or_else(|| anyhow!("missing argument <{}>", name))
}

fn parse_price(s: &str) -> Result<f64> {
    s.parse::<f64>().with_context(|| format!("invalid price '{}'", s))
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("invalid RFC 3339 timestamp '{}'", s))?
        .with_timezone(&Utc))
}

fn parse_filters(rest: &[String]) -> Result<FieldFilters> {
    let mut filters = FieldFilters::default();
    let mut i = 0;
    while i < rest.len() {
        let value = rest.get(i + 1).ok_or_else(|| anyhow!("{} requires a value", rest[i]))?;
        match rest[i].as_str() {
            "--location" => filters.location = Some(value.clone()),
            "--min-price" => filters.min_price = Some(parse_price(value)?),
            "--max-price" => filters.max_price = Some(parse_price(value)?),
            other => return Err(anyhow!("unknown filter {}", other)),
        }
        i += 2;
    }
    Ok(filters)
}

enum Outcome {
    Done,
    Denied,
}

async fn dispatch(cmd: &str, rest: &[String], api: &Api, guard: &SessionGuard) -> Result<ApiResult<Outcome>> {
    let out = match cmd {
        "login" => {
            let (email, password) = (arg(rest, 0, "email")?, arg(rest, 1, "password")?);
            guard.sign_in(&api.auth, email, password).await.map(|role| {
                println!("Login berhasil! role={}", role);
                Outcome::Done
            })
        }
        "register" => {
            let (name, email, password) = (arg(rest, 0, "name")?, arg(rest, 1, "email")?, arg(rest, 2, "password")?);
            api.auth.register(name, email, password).await.map(|_| {
                println!("Registrasi berhasil! Silakan login.");
                Outcome::Done
            })
        }
        "logout" => {
            guard.sign_out(&api.auth).await;
            println!("Logout berhasil");
            Ok(Outcome::Done)
        }
        "whoami" => {
            match guard.store().role() {
                Some(role) if guard.store().is_authenticated() => println!("{}", role),
                _ => println!("anonymous"),
            }
            Ok(Outcome::Done)
        }
        "refresh" => guard.refresh(&api.auth).await.map(|_| Outcome::Done),
        "fields" => {
            let filters = parse_filters(rest)?;
            match api.fields.list(&filters).await {
                Ok(fields) => { print_json(&fields)?; Ok(Outcome::Done) }
                Err(e) => Err(e),
            }
        }
        "field" => match api.fields.get(arg(rest, 0, "id")?).await {
            Ok(field) => { print_json(&field)?; Ok(Outcome::Done) }
            Err(e) => Err(e),
        },
        "field-create" | "field-update" | "field-delete" => {
            if !guard.require_role(Role::Admin) {
                return Ok(Ok(Outcome::Denied));
            }
            let res = match cmd {
                "field-create" => {
                    let req = FieldRequest {
                        name: arg(rest, 0, "name")?.to_string(),
                        location: arg(rest, 1, "location")?.to_string(),
                        price: parse_price(arg(rest, 2, "price")?)?,
                    };
                    api.fields.create(&req).await.map(Some)
                }
                "field-update" => {
                    let req = FieldRequest {
                        name: arg(rest, 1, "name")?.to_string(),
                        location: arg(rest, 2, "location")?.to_string(),
                        price: parse_price(arg(rest, 3, "price")?)?,
                    };
                    api.fields.update(arg(rest, 0, "id")?, &req).await.map(Some)
                }
                _ => api.fields.delete(arg(rest, 0, "id")?).await.map(|_| None),
            };
            match res {
                Ok(Some(field)) => { print_json(&field)?; Ok(Outcome::Done) }
                Ok(None) => { println!("Lapangan berhasil dihapus"); Ok(Outcome::Done) }
                Err(e) => Err(e),
            }
        }
        "bookings" => {
            let all = rest.iter().any(|a| a == "--all");
            let required = if all { Role::Admin } else { Role::User };
            if !guard.require_role(required) {
                return Ok(Ok(Outcome::Denied));
            }
            let res = if all { api.bookings.list_all().await } else { api.bookings.list_mine().await };
            match res {
                Ok(bookings) => { print_json(&bookings)?; Ok(Outcome::Done) }
                Err(e) => Err(e),
            }
        }
        "book" | "cancel" | "pay" => {
            if !guard.require_role(Role::User) {
                return Ok(Ok(Outcome::Denied));
            }
            match cmd {
                "book" => {
                    let field_id = arg(rest, 0, "field_id")?;
                    let (start, end) = (parse_time(arg(rest, 1, "start")?)?, parse_time(arg(rest, 2, "end")?)?);
                    match api.bookings.create(field_id, start, end).await {
                        Ok(b) => { print_json(&b)?; Ok(Outcome::Done) }
                        Err(e) => Err(e),
                    }
                }
                "cancel" => api.bookings.cancel(arg(rest, 0, "booking_id")?).await.map(|_| {
                    println!("Booking berhasil dibatalkan");
                    Outcome::Done
                }),
                _ => match api.payments.create_checkout_session(arg(rest, 0, "booking_id")?).await {
                    Ok(session) => { print_json(&session)?; Ok(Outcome::Done) }
                    Err(e) => Err(e),
                },
            }
        }
        other => return Err(anyhow!("unknown command '{}'", other)),
    };
    Ok(out)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);
    let mut config = Config::from_env();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--base" => {
                if i + 1 >= args.len() { eprintln!("--base requires a URL"); print_usage(&program); std::process::exit(2); }
                config.client.base_url = args[i + 1].clone();
                i += 2; continue;
            }
            "--session" => {
                if i + 1 >= args.len() { eprintln!("--session requires a path"); print_usage(&program); std::process::exit(2); }
                config.session_file = args[i + 1].clone().into();
                i += 2; continue;
            }
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            _ => break,
        }
    }
    let Some(cmd) = args.get(i).cloned() else {
        print_usage(&program);
        std::process::exit(2);
    };
    let rest = &args[i + 1..];

    let storage = JsonFileStorage::open(&config.session_file)
        .with_context(|| format!("opening session file {}", config.session_file.display()))?;
    let store = TokenStore::new(Arc::new(storage));
    let client = RequestClient::new(&config.client, store.clone())?;
    let guard = SessionGuard::new(store, Arc::new(ConsoleNavigator));
    client.subscribe(guard.clone());
    let api = Api::new(client);

    match dispatch(&cmd, rest, &api, &guard).await {
        Ok(Ok(Outcome::Done)) => Ok(()),
        Ok(Ok(Outcome::Denied)) => std::process::exit(3),
        Ok(Err(api_err)) => std::process::exit(report(&api_err)),
        Err(usage) => {
            eprintln!("{}", usage);
            print_usage(&program);
            std::process::exit(2);
        }
    }
}
