//! End-to-end walkthrough of the navigation engine on the in-memory
//! navigation context and outlet registry.
//!
//! Run with `cargo run --example spa_shell`.

use std::rc::Rc;

use futures::executor::LocalPool;
use futures::task::LocalSpawn;
use signpost::{
    Content, ContentProvider, InMemoryNavigation, NavigationContext, OutletHost, OutletRegistry,
    Result, RouteTable, Router, ScopeDefinition,
};

fn page(content: &'static str) -> ContentProvider {
    Rc::new(move || Content::ready(content))
}

fn print_outlets(label: &str, nav: &InMemoryNavigation, registry: &OutletRegistry) {
    println!("-- {label}");
    println!("   fragment: #{}", nav.fragment());
    for outlet in ["shell", "main"] {
        if let Some(content) = registry.content_of(&outlet.to_string()) {
            println!("   {outlet}: {content}");
        }
    }
}

fn main() -> Result<()> {
    let nav = Rc::new(InMemoryNavigation::with_fragment("/welcome"));
    let registry = Rc::new(OutletRegistry::new());
    registry.register("shell");
    registry.register("main");

    let mut pool = LocalPool::new();
    let spawner: Rc<dyn LocalSpawn> = Rc::new(pool.spawner());
    let mut router = Router::new(
        Rc::clone(&nav) as Rc<dyn NavigationContext>,
        Rc::clone(&registry) as Rc<dyn OutletHost>,
        spawner,
    );

    router.add_on_path_change(|old, new| {
        println!("   path change: {old:?} -> {new}");
    });

    // Chrome that stays put no matter where navigation goes.
    router.configure(ScopeDefinition::fixed(
        "shell",
        page("<nav>broken</nav>"),
        page("<nav>home | admin</nav>"),
    ))?;

    // The main region: exact keys, one redirect, one deferred page.
    let table = RouteTable::new()
        .with_content("/welcome", page("<h1>Welcome</h1>"))
        .with_redirect("/start", "/welcome")
        .with_content(
            "/admin/users",
            Rc::new(|| Content::deferred(async { "<ul>loaded user list</ul>".to_string() })),
        );
    let main_scope = router.configure(ScopeDefinition::routes(
        "main",
        page("<h1>404</h1>"),
        table,
    ))?;
    print_outlets("initial render", &nav, &registry);

    router.go_to("/start");
    router.pump()?;
    print_outlets("redirect canonicalized to /welcome", &nav, &registry);

    router.go_to("/admin/users");
    router.pump()?;
    pool.run_until_stalled();
    print_outlets("deferred admin page settled", &nav, &registry);

    router.set_query_params([("tab", Some("active"))], true);
    println!("-- suppressed query update");
    println!("   fragment: #{}", nav.fragment());
    println!("   tab = {:?}", router.query_params().get("tab"));

    router.go_to("/no/such/page");
    router.pump()?;
    print_outlets("not-found fallback", &nav, &registry);

    main_scope.close();
    router.go_to("/welcome");
    router.pump()?;
    print_outlets("after close, main no longer reacts", &nav, &registry);

    println!("-- history: {:?}", nav.history());
    Ok(())
}
