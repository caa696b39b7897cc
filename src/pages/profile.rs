use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::api::{ApiClient, ProfileUpdate};
use crate::app::SessionContext;
use crate::components::role_badge::RoleBadge;
use crate::config::AppConfig;
use crate::session::SessionStore;

#[component]
pub fn ProfilePage() -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let config = StoredValue::new(expect_context::<AppConfig>());

    let current = ctx.session.get_untracked();
    let (name, set_name) = signal(current.as_ref().map(|s| s.name.clone()).unwrap_or_default());
    let (email, set_email) = signal(current.as_ref().map(|s| s.email.clone()).unwrap_or_default());
    let (status, set_status) = signal::<Option<String>>(None);
    let (error, set_error) = signal::<Option<String>>(None);
    let (saving, set_saving) = signal(false);

    let save = move |_| {
        let Some(session) = ctx.session.get_untracked() else {
            return;
        };
        let update = ProfileUpdate {
            name: name.get_untracked().trim().to_string(),
            email: email.get_untracked().trim().to_string(),
        };
        if update.name.is_empty() || !update.email.contains('@') {
            set_error.set(Some("Enter a name and a valid email address".to_string()));
            return;
        }
        set_error.set(None);
        set_status.set(None);
        set_saving.set(true);
        let config = config.get_value();
        spawn_local(async move {
            let client = ApiClient::from_config(&config);
            let store = SessionStore::for_browser(&config.session_key);
            match store.update_profile(&client, &session, &update).await {
                Ok(updated) => {
                    ctx.set_session.set(Some(updated));
                    set_status.set(Some("Profile saved".to_string()));
                }
                Err(e) => set_error.set(Some(format!("Failed to save: {}", e))),
            }
            set_saving.set(false);
        });
    };

    view! {
        <div class="page profile-page">
            <h2>"Profile"</h2>
            {move || {
                ctx.session
                    .get()
                    .map(|s| {
                        view! {
                            <div class="profile-header">
                                <img class="avatar avatar-large" src=s.avatar_src() alt="avatar" />
                                <p class="page-description">
                                    {s.id.clone()} " " <RoleBadge role=s.role />
                                </p>
                            </div>
                        }
                    })
            }}

            <section class="settings-section">
                <div class="form-group">
                    <label for="profile-name">"Name"</label>
                    <input
                        id="profile-name"
                        class="input"
                        prop:value=move || name.get()
                        on:input=move |ev| set_name.set(event_target_value(&ev))
                    />
                </div>
                <div class="form-group">
                    <label for="profile-email">"Email"</label>
                    <input
                        id="profile-email"
                        type="email"
                        class="input"
                        prop:value=move || email.get()
                        on:input=move |ev| set_email.set(event_target_value(&ev))
                    />
                </div>
                <button class="btn btn-save" prop:disabled=move || saving.get() on:click=save>
                    {move || if saving.get() { "Saving..." } else { "Save" }}
                </button>
                <Show when=move || status.get().is_some()>
                    <span class="status-text">{move || status.get().unwrap_or_default()}</span>
                </Show>
                <Show when=move || error.get().is_some()>
                    <div class="error-banner">{move || error.get().unwrap_or_default()}</div>
                </Show>
            </section>
        </div>
    }
}
