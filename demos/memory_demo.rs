//! Routing over an in-memory history
//!
//! Run with `RUST_LOG=debug cargo run --example memory_demo` to see the
//! router's own logging alongside the demo output.

use history_router::{
    for_prefix, App, AppSettings, Element, EventKind, FilterResult, FormSubmit, LinkClick,
    MemoryHistory, Route, RouteParams,
};
use std::cell::Cell;
use std::rc::Rc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if let Err(err) = AppSettings::from_json(r#"{ "link_selector": "nav > a" }"#) {
        println!("rejected settings: {}", err);
    }
    let settings = AppSettings::from_json(r#"{ "link_selector": "a[data-route]" }"#)?;

    let app = App::new(MemoryHistory::new("/"), settings)?;
    let signed_in = Rc::new(Cell::new(false));

    app.get("/", |_| println!("home"))
        .get("/login", |_| println!("please sign in"))
        .get("/search", |request| {
            println!("searching for {:?}", request.query().get("q").unwrap_or(""));
        })
        .get("/admin/*", |request| println!("admin page {}", request.path()))
        .route(
            Route::get("/users/:id<int>", |request| {
                println!("user #{}", request.param("id").unwrap_or_default());
            })
            .name("user"),
        );

    let gate = Rc::clone(&signed_in);
    app.before(for_prefix("/admin", move |_| {
        if gate.get() {
            FilterResult::Continue
        } else {
            FilterResult::redirect("/login")
        }
    }));

    app.on(EventKind::RouteNotFound, |event| {
        if let Some(request) = event.request() {
            println!("404: {}", request);
        }
    });

    app.start()?;
    app.load();

    let user_url = app.url_for("user", &[("id", "42")].into_iter().collect::<RouteParams>())?;
    let link = Element::anchor(user_url).attr("data-route", "");
    println!("click: {:?}", app.handle_click(&LinkClick::new(link)).ignore_reason());

    let search = FormSubmit::new(Element::form("get", "/search")).field("q", "history api");
    app.handle_submit(&search);

    app.navigate("/admin/settings");
    signed_in.set(true);
    app.navigate("/admin/settings");

    app.navigate("/missing");

    app.history().back();
    app.history().back();

    let host = app.history().host();
    println!("history ({} entries):", host.len());
    for (idx, entry) in host.entries().iter().enumerate() {
        let marker = if idx == host.current_index() { '>' } else { ' ' };
        println!("{} {}", marker, entry.url);
    }
    drop(host);

    app.stop()?;
    Ok(())
}
