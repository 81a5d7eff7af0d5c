//! Navigation lifecycle: loading transitions, supersession, redirects,
//! hydration, data retention and teardown.

mod common;

use common::*;
use data_navigator::*;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_loading_is_observable_before_await() {
    let deferred = Deferred::new();
    let (router, _history) = router_with(vec![Route::new("/")
        .id("root")
        .child(Route::new("a").id("a").loader(deferred.loader()))]);
    let recorder = Recorder::attach(&router);

    let navigation = router.push("/a");

    let state = router.state();
    assert!(state.transition.is_loading());
    assert_eq!(state.transition.location().unwrap().pathname, "/a");
    assert_eq!(state.location.pathname, "/", "nothing committed yet");
    assert_eq!(deferred.calls(), 1);
    assert_eq!(recorder.labels(), vec!["loading:/a"]);

    deferred.resolve_next(data(json!("A")));
    let result = navigation.await;

    assert!(result.is_committed());
    let state = router.state();
    assert!(state.is_idle());
    assert!(state.initialized);
    assert_eq!(state.location.pathname, "/a");
    assert_eq!(state.match_ids(), vec!["root", "a"]);
    assert_eq!(state.route_data.loader_data("a"), Some(&json!("A")));
    assert_eq!(recorder.labels(), vec!["loading:/a", "idle:/a"]);
}

#[tokio::test]
async fn test_immediate_loader_still_passes_through_loading() {
    let (router, _history) = router_with(vec![Route::new("/users/:id")
        .id("user")
        .loader(|args: LoaderArgs| async move { data(json!({ "id": args.params.get("id") })) })]);
    let recorder = Recorder::attach(&router);

    let navigation = router.push("/users/7");
    assert!(router.state().transition.is_loading());
    assert!(navigation.await.is_committed());

    assert_eq!(recorder.labels(), vec!["loading:/users/7", "idle:/users/7"]);
    assert_eq!(
        router.state().route_data.loader_data("user"),
        Some(&json!({ "id": "7" }))
    );
}

#[tokio::test]
async fn test_route_without_loaders_commits_synchronously() {
    let (router, history) = router_with(vec![Route::new("/"), Route::new("/about")]);
    let recorder = Recorder::attach(&router);

    let navigation = router.push("/about");

    // already committed with a single notification
    assert_eq!(router.state().location.pathname, "/about");
    assert_eq!(recorder.labels(), vec!["idle:/about"]);
    assert_eq!(history.location().pathname, "/about");
    assert!(navigation.await.is_committed());
}

#[tokio::test]
async fn test_last_navigation_wins() {
    let a = Deferred::new();
    let b = Deferred::new();
    let (router, history) = router_with(vec![Route::new("/").id("root").children(vec![
        Route::new("a").id("a").loader(a.loader()),
        Route::new("b").id("b").loader(b.loader()),
    ])]);
    let recorder = Recorder::attach(&router);

    let first = router.push("/a");
    let second = router.push("/b");
    assert!(second.id() > first.id());

    // the newer navigation settles first, the stale one afterwards
    b.resolve_next(data(json!("B")));
    a.resolve_next(data(json!("A")));
    let (first, second) = futures::join!(first, second);

    assert!(first.is_superseded());
    assert!(second.is_committed());

    let state = router.state();
    assert_eq!(state.location.pathname, "/b");
    assert_eq!(state.route_data.loader_data("b"), Some(&json!("B")));
    assert!(!state.route_data.contains("a"));

    assert_eq!(recorder.labels(), vec!["loading:/a", "loading:/b", "idle:/b"]);
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_stale_result_arriving_first_is_discarded() {
    let a = Deferred::new();
    let b = Deferred::new();
    let (router, _history) = router_with(vec![
        Route::new("/a").id("a").loader(a.loader()),
        Route::new("/b").id("b").loader(b.loader()),
    ]);
    let recorder = Recorder::attach(&router);

    let first = router.push("/a");
    let second = router.push("/b");

    a.resolve_next(data(json!("A")));
    assert!(first.await.is_superseded());
    assert!(router.state().transition.is_loading(), "second still in flight");
    assert!(recorder.idle_pathnames().is_empty());

    b.resolve_next(data(json!("B")));
    assert!(second.await.is_committed());
    assert_eq!(recorder.idle_pathnames(), vec!["/b"]);
}

#[tokio::test]
async fn test_superseded_navigation_signal_is_cancelled() {
    let seen: Arc<Mutex<Vec<CancellationToken>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let slow = move |args: LoaderArgs| -> BoxFuture<'static, LoaderResult> {
        sink.lock().push(args.signal.clone());
        async move { args.or_cancelled(futures::future::pending()).await }.boxed()
    };
    let (router, _history) = router_with(vec![
        Route::new("/slow").id("slow").loader(slow),
        Route::new("/fast").id("fast").loader(|_| async { data(json!("fast")) }),
    ]);

    let first = router.push("/slow");
    assert!(!seen.lock()[0].is_cancelled());

    let second = router.push("/fast");
    assert!(seen.lock()[0].is_cancelled());

    let (first, second) = futures::join!(first, second);
    assert!(first.is_superseded());
    assert!(second.is_committed());
    assert!(!router.state().route_data.contains("slow"));
}

#[tokio::test]
async fn test_redirect_commits_only_the_target() {
    let (new_calls, new_loader) = counting(json!("new"));
    let (router, history) = router_with(vec![Route::new("/").id("root").children(vec![
        Route::new("old").id("old").loader(|_| async { redirect("/new") }),
        Route::new("new").id("new").loader(new_loader),
    ])]);
    let recorder = Recorder::attach(&router);

    let result = router.push("/old").await;

    assert_eq!(result.location().map(|l| l.pathname.as_str()), Some("/new"));
    assert_eq!(count(&new_calls), 1);
    assert_eq!(recorder.idle_pathnames(), vec!["/new"]);
    assert_eq!(recorder.labels(), vec!["loading:/old", "loading:/new", "idle:/new"]);

    let state = router.state();
    assert_eq!(state.route_data.loader_data("new"), Some(&json!("new")));
    assert!(!state.route_data.contains("old"));
    assert_eq!(history.location().pathname, "/new");
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_redirect_loop_is_bounded() {
    init_logging();
    let router = Router::new(
        RouterOptions::new(vec![
            Route::new("/a").loader(|_| async { redirect("/b") }),
            Route::new("/b").loader(|_| async { redirect("/a") }),
        ])
        .max_redirects(3),
    )
    .unwrap();

    let result = router.push("/a").await;

    assert!(matches!(
        result,
        NavigationResult::Error(NavigationError::TooManyRedirects { limit: 3, .. })
    ));
    let state = router.state();
    assert!(state.is_idle());
    assert_eq!(state.location.pathname, "/");
    assert!(matches!(state.error, Some(NavigationError::TooManyRedirects { .. })));
}

#[tokio::test]
async fn test_redirect_from_superseded_navigation_is_ignored() {
    let gate = Deferred::new();
    let (router, _history) = router_with(vec![
        Route::new("/a").loader(gate.loader()),
        Route::new("/b"),
        Route::new("/elsewhere"),
    ]);

    let first = router.push("/a");
    let second = router.push("/b");
    assert!(second.await.is_committed());

    gate.resolve_next(redirect("/elsewhere"));
    assert!(first.await.is_superseded());
    assert_eq!(router.state().location.pathname, "/b");
}

#[tokio::test]
async fn test_not_found() {
    let (router, _history) = router_with(vec![Route::new("/")]);
    let recorder = Recorder::attach(&router);

    let result = router.push("/nope").await;

    assert_eq!(
        result,
        NavigationResult::NotFound {
            path: "/nope".to_string()
        }
    );
    let state = router.state();
    assert!(state.is_idle());
    assert_eq!(state.location.pathname, "/");
    assert_eq!(
        state.error,
        Some(NavigationError::RouteNotFound {
            path: "/nope".to_string()
        })
    );
    assert_eq!(recorder.len(), 1);

    // the next commit clears the error
    assert!(router.push("/").await.is_committed());
    assert!(router.state().error.is_none());
}

#[tokio::test]
async fn test_loader_errors_are_per_route() {
    let (router, _history) = router_with(vec![Route::new("/")
        .id("root")
        .loader(|_| async { Err::<LoaderOutput, _>(LoaderError::failed("db down")) })
        .children(vec![
            Route::new("ok").id("ok").loader(|_| async { data(json!("fine")) }),
            Route::new("boom").id("boom").loader(|_| async {
                if true {
                    panic!("loader exploded");
                }
                data(json!(null))
            }),
        ])]);

    assert!(router.push("/ok").await.is_committed());
    let state = router.state();
    assert_eq!(state.route_data.error("root"), Some(&LoaderError::failed("db down")));
    assert_eq!(state.route_data.loader_data("ok"), Some(&json!("fine")));
    assert!(state.error.is_none());

    assert!(router.push("/boom").await.is_committed());
    let state = router.state();
    assert!(matches!(
        state.route_data.error("boom"),
        Some(LoaderError::Panicked { message }) if message == "loader exploded"
    ));
}

#[tokio::test]
async fn test_unmatched_data_is_pruned_and_stable_data_retained() {
    let (root_calls, root_loader) = counting(json!("root"));
    let (a_calls, a_loader) = counting(json!("a"));
    let (router, _history) = router_with(vec![Route::new("/")
        .id("root")
        .loader(root_loader)
        .revalidate(false)
        .children(vec![
            Route::index().id("home"),
            Route::new("a").id("a").loader(a_loader),
            Route::new("b").id("b").loader(|_| async { data(json!("b")) }),
        ])]);

    assert!(router.initialize().await.is_committed());
    assert_eq!(count(&root_calls), 1);

    assert!(router.push("/a").await.is_committed());
    assert_eq!(count(&root_calls), 1, "unchanged non-revalidating route skipped");
    assert_eq!(count(&a_calls), 1);
    assert_eq!(router.state().route_data.loader_data("root"), Some(&json!("root")));

    assert!(router.push("/b").await.is_committed());
    let state = router.state();
    assert!(!state.route_data.contains("a"));
    assert!(state.route_data.contains("root"));
    assert_eq!(state.route_data.len(), 2);

    // revalidation re-runs everything
    assert!(router.revalidate().await.is_committed());
    assert_eq!(count(&root_calls), 2);
    assert_eq!(router.state().location.pathname, "/b");
}

#[tokio::test]
async fn test_revalidating_routes_reload_on_every_navigation() {
    let (root_calls, root_loader) = counting(json!("root"));
    let (router, _history) = router_with(vec![Route::new("/")
        .id("root")
        .loader(root_loader)
        .children(vec![Route::new("a"), Route::new("b")])]);

    assert!(router.push("/a").await.is_committed());
    assert!(router.push("/b").await.is_committed());
    assert_eq!(count(&root_calls), 2);
}

#[tokio::test]
async fn test_hydration_skips_seeded_loaders() {
    let (root_calls, root_loader) = counting(json!("fresh root"));
    let (home_calls, home_loader) = counting(json!("fresh home"));
    let hydration = HydrationData::default()
        .loader_data("root", json!("seeded root"))
        .loader_data("home", json!("seeded home"));

    let router = Router::new(
        RouterOptions::new(vec![Route::new("/")
            .id("root")
            .loader(root_loader)
            .child(Route::index().id("home").loader(home_loader))])
        .hydration(hydration),
    )
    .unwrap();
    let recorder = Recorder::attach(&router);
    assert!(!router.state().initialized);

    let navigation = router.initialize();

    let state = router.state();
    assert!(state.initialized);
    assert!(state.is_idle());
    assert_eq!(state.route_data.loader_data("root"), Some(&json!("seeded root")));
    assert_eq!(state.route_data.loader_data("home"), Some(&json!("seeded home")));
    assert_eq!(count(&root_calls), 0);
    assert_eq!(count(&home_calls), 0);
    assert_eq!(recorder.labels(), vec!["idle:/"]);
    assert!(navigation.await.is_committed());
}

#[tokio::test]
async fn test_partial_hydration_loads_the_rest() {
    let (root_calls, root_loader) = counting(json!("fresh root"));
    let (home_calls, home_loader) = counting(json!("fresh home"));
    let history = Arc::new(MemoryHistory::new("/"));

    let router = Router::new(
        RouterOptions::new(vec![Route::new("/")
            .id("root")
            .loader(root_loader)
            .child(Route::index().id("home").loader(home_loader))])
        .history(Arc::clone(&history))
        .hydration(HydrationData::default().error("root", json!({ "status": 500 }))),
    )
    .unwrap();

    let navigation = router.initialize();
    assert!(router.state().transition.is_loading());
    assert!(navigation.await.is_committed());

    let state = router.state();
    assert_eq!(count(&root_calls), 0, "seeded errors count as seeded");
    assert_eq!(count(&home_calls), 1);
    assert_eq!(
        state.route_data.error("root"),
        Some(&LoaderError::Data(json!({ "status": 500 })))
    );
    assert_eq!(state.route_data.loader_data("home"), Some(&json!("fresh home")));
    assert_eq!(history.len(), 1, "initial load does not touch history");
}

#[tokio::test]
async fn test_panicking_listener_does_not_block_others() {
    let (router, _history) = router_with(vec![Route::new("/"), Route::new("/next")]);
    let _bad = router.subscribe(|_| panic!("listener failure"));
    let recorder = Recorder::attach(&router);

    assert!(router.push("/next").await.is_committed());
    assert_eq!(recorder.labels(), vec!["idle:/next"]);
}

#[tokio::test]
async fn test_unsubscribed_listener_is_not_called() {
    let (router, _history) = router_with(vec![Route::new("/"), Route::new("/next")]);
    let recorder = Recorder::attach(&router);
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    let subscription = router.subscribe(move |_| *counter.lock() += 1);

    assert!(router.push("/next").await.is_committed());
    subscription.unsubscribe();
    assert!(router.push("/").await.is_committed());

    assert_eq!(*calls.lock(), 1);
    assert_eq!(recorder.len(), 2);
}

#[tokio::test]
async fn test_listener_may_navigate_reentrantly() {
    let (router, _history) = router_with(vec![Route::new("/"), Route::new("/login"), Route::new("/private")]);
    let handle = router.clone();
    let _guard = router.subscribe(move |state| {
        if state.is_idle() && state.location.pathname == "/private" {
            let _ = handle.replace("/login");
        }
    });

    assert!(router.push("/private").await.is_committed());
    assert_eq!(router.state().location.pathname, "/login");
}

#[tokio::test]
async fn test_later_listeners_see_states_in_commit_order() {
    let (router, _history) = router_with(vec![Route::new("/"), Route::new("/login"), Route::new("/private")]);
    let handle = router.clone();
    let _guard = router.subscribe(move |state| {
        if state.is_idle() && state.location.pathname == "/private" {
            let _ = handle.replace("/login");
        }
    });
    let recorder = Recorder::attach(&router);

    assert!(router.push("/private").await.is_committed());

    assert_eq!(recorder.idle_pathnames(), vec!["/private", "/login"]);
    let last = recorder.states().pop().expect("notified");
    assert_eq!(last.location, router.state().location);
}

#[tokio::test]
async fn test_handlers_may_read_state_synchronously() {
    let slot: Arc<OnceLock<Router>> = Arc::default();
    let seen: Arc<Mutex<Vec<String>>> = Arc::default();

    let observe = |slot: &Arc<OnceLock<Router>>, seen: &Arc<Mutex<Vec<String>>>, value: &'static str| {
        let slot = Arc::clone(slot);
        let seen = Arc::clone(seen);
        move |_args: LoaderArgs| {
            if let Some(router) = slot.get() {
                let state = router.state();
                let pending = state.transition.location().map(|l| l.pathname.clone()).unwrap_or_default();
                seen.lock().push(format!("{value}:{pending}"));
            }
            async move { data(json!(value)) }
        }
    };

    let (router, _history) = router_with(vec![
        Route::new("/"),
        Route::new("/a")
            .id("a")
            .loader(observe(&slot, &seen, "loader"))
            .action(observe(&slot, &seen, "action")),
    ]);
    assert!(slot.set(router.clone()).is_ok());

    assert!(router.push("/a").await.is_committed());
    assert!(router.submit("/a", Submission::post(json!({}))).await.is_committed());

    assert_eq!(*seen.lock(), vec!["loader:/a", "action:/a", "loader:/a"]);
    assert_eq!(router.state().route_data.loader_data("a"), Some(&json!("loader")));
}

#[tokio::test]
async fn test_navigate_options() {
    let (router, history) = router_with(vec![Route::new("/"), Route::new("/a"), Route::new("/users/:id/edit")]);

    let options = NavigateOptions::replace().with_state(json!({ "from": "test" }));
    assert!(router.navigate("/a?tab=1#top", options).await.is_committed());

    let location = router.state().location;
    assert_eq!(location.path(), "/a?tab=1#top");
    assert_eq!(location.state, Some(json!({ "from": "test" })));
    assert_eq!(location.query().get("tab"), Some("1"));
    assert_eq!(history.len(), 1);

    assert!(router.push("/users/42").await.is_not_found());
    assert!(router.push("/users/7/edit").await.is_committed());
    assert!(router.push("../../9/edit").await.is_committed());
    assert_eq!(router.state().location.pathname, "/users/9/edit");
}

#[tokio::test]
async fn test_dispose() {
    let deferred = Deferred::new();
    let (router, _history) = router_with(vec![Route::new("/"), Route::new("/a").loader(deferred.loader())]);
    let recorder = Recorder::attach(&router);

    let in_flight = router.push("/a");
    assert_eq!(recorder.len(), 1);

    router.dispose();
    assert!(router.is_disposed());

    deferred.resolve_next(data(json!("late")));
    assert!(in_flight.await.is_superseded());

    let result = router.push("/").await;
    assert_eq!(result, NavigationResult::Error(NavigationError::Disposed));
    assert_eq!(recorder.len(), 1, "subscribers dropped on dispose");
}
