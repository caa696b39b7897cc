use leptos::prelude::*;
use leptos_router::components::*;
use leptos_router::hooks::use_location;
use leptos_router::path;
use tracing::{debug, info};

use crate::components::sidebar::Sidebar;
use crate::config::AppConfig;
use crate::guard::{self, Decision};
use crate::pages::admin::AdminHomePage;
use crate::pages::dashboard::DashboardPage;
use crate::pages::login::LoginPage;
use crate::pages::profile::ProfilePage;
use crate::pages::timetables::TimetablesPage;
use crate::pages::users::UsersPage;
use crate::session::{Session, SessionStore};

/// The signed-in identity, shared with every page.
#[derive(Clone, Copy)]
pub struct SessionContext {
    pub session: ReadSignal<Option<Session>>,
    pub set_session: WriteSignal<Option<Session>>,
}

impl SessionContext {
    pub fn sign_out(&self, config: &AppConfig) {
        SessionStore::for_browser(&config.session_key).clear();
        self.set_session.set(None);
        info!("Signed out");
    }
}

#[component]
pub fn App(config: AppConfig) -> impl IntoView {
    // Restore the persisted session before the first route resolves
    let restored = SessionStore::for_browser(&config.session_key).restore();
    let (session, set_session) = signal(restored);
    provide_context(SessionContext {
        session,
        set_session,
    });
    provide_context(config);

    view! {
        <Router>
            <Routes fallback=|| {
                view! {
                    <Guarded>
                        <Shell>
                            <p class="not-found">"Page not found"</p>
                        </Shell>
                    </Guarded>
                }
            }>
                <Route path=path!("/login") view=|| view! { <Guarded><LoginPage /></Guarded> } />
                <Route path=path!("/") view=|| view! { <Guarded><Shell><DashboardPage /></Shell></Guarded> } />
                <Route path=path!("/admin") view=|| view! { <Guarded><Shell><AdminHomePage /></Shell></Guarded> } />
                <Route path=path!("/dashboard") view=|| view! { <Guarded><Shell><DashboardPage /></Shell></Guarded> } />
                <Route
                    path=path!("/dashboard/my-timetables")
                    view=|| view! { <Guarded><Shell><TimetablesPage /></Shell></Guarded> }
                />
                <Route path=path!("/users") view=|| view! { <Guarded><Shell><UsersPage /></Shell></Guarded> } />
                <Route path=path!("/profile") view=|| view! { <Guarded><Shell><ProfilePage /></Shell></Guarded> } />
            </Routes>
        </Router>
    }
}

/// Evaluates the access rules for the current location on every session or
/// route change, rendering either the children or a redirect.
#[component]
fn Guarded(children: ChildrenFn) -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let location = use_location();

    move || {
        let pathname = location.pathname.get();
        let search = location.search.get();
        let search = search.trim_start_matches('?');
        let target = if search.is_empty() {
            pathname
        } else {
            format!("{}?{}", pathname, search)
        };

        match ctx.session.with(|s| guard::resolve(s.as_ref(), &target)) {
            Decision::Allow => children().into_any(),
            Decision::RedirectTo(path) => {
                debug!("Redirecting {} to {}", target, path);
                view! { <Redirect path=path /> }.into_any()
            }
        }
    }
}

#[component]
fn Shell(children: Children) -> impl IntoView {
    view! {
        <div class="app-layout">
            <Sidebar />
            <main class="content">{children()}</main>
        </div>
    }
}
