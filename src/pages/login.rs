use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos_router::hooks::{use_location, use_navigate};
use wasm_bindgen_futures::spawn_local;

use crate::api::ApiClient;
use crate::app::SessionContext;
use crate::config::AppConfig;
use crate::guard;
use crate::session::SessionStore;

#[component]
pub fn LoginPage() -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let config = StoredValue::new(expect_context::<AppConfig>());
    let search = use_location().search;
    let navigate = use_navigate();

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal::<Option<String>>(None);
    let (is_submitting, set_is_submitting) = signal(false);

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        if is_submitting.get_untracked() {
            return;
        }
        set_error.set(None);
        set_is_submitting.set(true);

        let config = config.get_value();
        let navigate = navigate.clone();
        let next = guard::next_from_query(&search.get_untracked());
        let email = email.get_untracked().trim().to_string();
        let password = password.get_untracked();
        spawn_local(async move {
            let client = ApiClient::from_config(&config);
            let store = SessionStore::for_browser(&config.session_key);
            match store.authenticate(&client, &email, &password).await {
                Ok(session) => {
                    let target = guard::post_login_target(&session, next.as_deref());
                    ctx.set_session.set(Some(session));
                    navigate(&target, Default::default());
                }
                Err(failure) => {
                    set_error.set(Some(failure.to_string()));
                    set_is_submitting.set(false);
                }
            }
        });
    };

    view! {
        <div class="login-layout">
            <form class="card login-card" on:submit=on_submit>
                <h2>"Sign in"</h2>
                <p class="page-description">"Timetable scheduling console"</p>

                <div class="form-group">
                    <label for="login-email">"Email"</label>
                    <input
                        id="login-email"
                        type="email"
                        class="input"
                        autocomplete="username"
                        prop:value=move || email.get()
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                    />
                </div>
                <div class="form-group">
                    <label for="login-password">"Password"</label>
                    <input
                        id="login-password"
                        type="password"
                        class="input"
                        autocomplete="current-password"
                        prop:value=move || password.get()
                        on:input=move |ev| set_password.set(event_target_value(&ev))
                    />
                </div>

                <Show when=move || error.get().is_some()>
                    <div class="error-banner">{move || error.get().unwrap_or_default()}</div>
                </Show>

                <button
                    type="submit"
                    class="btn btn-primary"
                    prop:disabled=move || {
                        is_submitting.get() || email.get().trim().is_empty()
                            || password.get().is_empty()
                    }
                >
                    {move || if is_submitting.get() { "Signing in..." } else { "Sign in" }}
                </button>
            </form>
        </div>
    }
}
