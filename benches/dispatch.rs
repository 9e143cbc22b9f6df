use std::rc::Rc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use futures::executor::LocalPool;
use futures::task::LocalSpawn;
use signpost::logging::{LogEvent, LogSink};
use signpost::{
    Content, ContentProvider, InMemoryNavigation, Logger, LoggingResult, NavigationContext,
    OutletHost, OutletRegistry, Result, RouteTable, Router, RouterConfig, ScopeDefinition,
};

#[derive(Clone, Default)]
struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _event: &LogEvent) -> LoggingResult<()> {
        Ok(())
    }
}

fn page(content: &'static str) -> ContentProvider {
    Rc::new(move || Content::ready(content))
}

struct BenchRouter {
    pool: LocalPool,
    router: Router,
}

fn build_router(fragment: &str, outlets: &[&str]) -> BenchRouter {
    let nav = Rc::new(InMemoryNavigation::with_fragment(fragment));
    let registry = Rc::new(OutletRegistry::new());
    for outlet in outlets {
        registry.register(*outlet);
    }
    let pool = LocalPool::new();
    let spawner: Rc<dyn LocalSpawn> = Rc::new(pool.spawner());

    let mut config = RouterConfig::default();
    config.logger = Some(Logger::new(NullSink));
    config.enable_metrics();

    let router = Router::with_config(
        nav as Rc<dyn NavigationContext>,
        registry as Rc<dyn OutletHost>,
        spawner,
        config,
    );
    BenchRouter { pool, router }
}

fn run_script(bench: &mut BenchRouter, script: &[&str]) -> Result<()> {
    for path in script {
        bench.router.go_to(path);
        bench.router.pump()?;
    }
    bench.pool.run_until_stalled();
    Ok(())
}

fn deep_table() -> RouteTable {
    let mut table = RouteTable::new();
    table.insert_content("/inbox", page("inbox"));
    table.insert_content("/inbox/archive", page("archive"));
    table.insert_content("/inbox/archive/2024", page("archive-year"));
    table.insert_content("/settings", page("settings"));
    table.insert_content("/settings/profile", page("profile"));
    table
}

fn dispatch_table_match(c: &mut Criterion) {
    let script = [
        "/inbox",
        "/inbox/archive/2024/uncharted",
        "/settings/profile",
        "/nowhere/at/all",
        "/inbox/archive",
    ];
    c.bench_function("dispatch_table_match", |b| {
        b.iter(|| {
            let mut bench = build_router("/inbox", &["main"]);
            bench
                .router
                .configure(ScopeDefinition::routes("main", page("nf"), deep_table()))
                .expect("configure");
            run_script(&mut bench, black_box(&script)).expect("script");
        });
    });
}

fn dispatch_redirect_chain(c: &mut Criterion) {
    let table = || {
        RouteTable::new()
            .with_content("/final", page("final"))
            .with_redirect("/hop3", "/final")
            .with_redirect("/hop2", "/hop3")
            .with_redirect("/hop1", "/hop2")
    };
    let script = ["/hop1", "/final", "/hop2", "/hop1/extra"];
    c.bench_function("dispatch_redirect_chain", |b| {
        b.iter(|| {
            let mut bench = build_router("/hop1", &["main"]);
            bench
                .router
                .configure(ScopeDefinition::routes("main", page("nf"), table()))
                .expect("configure");
            run_script(&mut bench, black_box(&script)).expect("script");
        });
    });
}

fn dispatch_nested_scopes(c: &mut Criterion) {
    let script = [
        "/admin/users",
        "/admin/groups",
        "/admin/users",
        "/elsewhere",
        "/admin/groups",
    ];
    c.bench_function("dispatch_nested_scopes", |b| {
        b.iter(|| {
            let mut bench = build_router("/admin/users", &["shell", "main"]);
            bench
                .router
                .configure(ScopeDefinition::fixed("shell", page("nf"), page("chrome")))
                .expect("shell scope");
            let table = RouteTable::new()
                .with_content("/users", page("users"))
                .with_content("/groups", page("groups"));
            bench
                .router
                .configure(
                    ScopeDefinition::routes("main", page("nf"), table)
                        .with_parent_prefix("/admin"),
                )
                .expect("admin scope");
            run_script(&mut bench, black_box(&script)).expect("script");
        });
    });
}

criterion_group!(
    benches,
    dispatch_table_match,
    dispatch_redirect_chain,
    dispatch_nested_scopes
);
criterion_main!(benches);
