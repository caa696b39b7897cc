use leptos::prelude::*;
use tracing::info;
use wasm_bindgen_futures::spawn_local;

use crate::api::{ApiClient, NewUser, UserRecord};
use crate::app::SessionContext;
use crate::components::role_badge::RoleBadge;
use crate::config::AppConfig;
use crate::session::{Role, Session};

/// Deep link into the timetables screen scoped to one identity.
pub fn timetable_link(id: &str) -> String {
    format!("/dashboard/my-timetables?teacherId={}", urlencoding::encode(id))
}

/// Admins may view any teacher's timetable; teachers only their own.
/// Admin identities have no timetable.
pub fn may_view_timetable(viewer: &Session, record: &UserRecord) -> bool {
    record.role != Role::Admin && (viewer.is_admin() || viewer.id == record.id)
}

pub fn may_delete(viewer: &Session, record: &UserRecord) -> bool {
    viewer.is_admin() && record.role != Role::Admin
}

fn validate(draft: &NewUser) -> Result<(), String> {
    if draft.id.trim().is_empty() || draft.name.trim().is_empty() {
        return Err("Id and name are required".to_string());
    }
    if !draft.email.contains('@') {
        return Err("Enter a valid email address".to_string());
    }
    if draft.password.is_empty() {
        return Err("A password is required".to_string());
    }
    Ok(())
}

#[component]
pub fn UsersPage() -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let config = StoredValue::new(expect_context::<AppConfig>());

    let (users, set_users) = signal::<Vec<UserRecord>>(vec![]);
    let (loading, set_loading) = signal(true);
    let (error, set_error) = signal::<Option<String>>(None);
    let (status, set_status) = signal::<Option<String>>(None);

    // Add form state
    let (show_form, set_show_form) = signal(false);
    let (new_id, set_new_id) = signal(String::new());
    let (new_name, set_new_name) = signal(String::new());
    let (new_email, set_new_email) = signal(String::new());
    let (new_password, set_new_password) = signal(String::new());
    let (saving, set_saving) = signal(false);

    let is_admin = move || ctx.session.with(|s| s.as_ref().is_some_and(Session::is_admin));

    let load_users = move || {
        set_loading.set(true);
        let client = ApiClient::from_config(&config.get_value());
        spawn_local(async move {
            match client.list_users().await {
                Ok(list) => {
                    set_users.set(list);
                    set_error.set(None);
                }
                Err(e) => set_error.set(Some(format!("Failed to load users: {}", e))),
            }
            set_loading.set(false);
        });
    };

    // Load users on mount
    Effect::new(move |_| {
        load_users();
    });

    let on_create = move |_| {
        let draft = NewUser {
            id: new_id.get_untracked().trim().to_string(),
            name: new_name.get_untracked().trim().to_string(),
            email: new_email.get_untracked().trim().to_string(),
            password: new_password.get_untracked(),
        };
        if let Err(msg) = validate(&draft) {
            set_error.set(Some(msg));
            return;
        }
        set_saving.set(true);
        set_error.set(None);
        let client = ApiClient::from_config(&config.get_value());
        spawn_local(async move {
            match client.create_user(&draft).await {
                Ok(created) => {
                    info!("Created user {}", created.id);
                    set_status.set(Some(format!("Added {}", created.name)));
                    set_new_id.set(String::new());
                    set_new_name.set(String::new());
                    set_new_email.set(String::new());
                    set_new_password.set(String::new());
                    set_show_form.set(false);
                    load_users();
                }
                Err(e) => set_error.set(Some(e.to_string())),
            }
            set_saving.set(false);
        });
    };

    let on_delete = move |record: UserRecord| {
        let confirmed = web_sys::window()
            .and_then(|w| {
                w.confirm_with_message(&format!("Delete {} ({})?", record.name, record.id))
                    .ok()
            })
            .unwrap_or(false);
        if !confirmed {
            return;
        }
        let client = ApiClient::from_config(&config.get_value());
        spawn_local(async move {
            match client.delete_user(&record.id).await {
                Ok(()) => {
                    info!("Deleted user {}", record.id);
                    set_users.update(|list| list.retain(|u| u.id != record.id));
                    set_status.set(Some(format!("Deleted {}", record.name)));
                }
                Err(e) => set_error.set(Some(e.to_string())),
            }
        });
    };

    view! {
        <div class="page users-page">
            <div class="page-header">
                <h2>{move || if is_admin() { "Users" } else { "Teachers" }}</h2>
                <Show when=is_admin>
                    <button
                        class="btn btn-primary"
                        on:click=move |_| set_show_form.update(|v| *v = !*v)
                    >
                        {move || if show_form.get() { "Cancel" } else { "Add User" }}
                    </button>
                </Show>
            </div>

            <Show when=move || error.get().is_some()>
                <div class="error-banner">{move || error.get().unwrap_or_default()}</div>
            </Show>
            <Show when=move || status.get().is_some()>
                <span class="status-text">{move || status.get().unwrap_or_default()}</span>
            </Show>

            <Show when=move || show_form.get() && is_admin()>
                <div class="card user-form">
                    <div class="form-group">
                        <label for="new-user-id">"Id"</label>
                        <input
                            id="new-user-id"
                            class="input"
                            placeholder="T-12"
                            prop:value=move || new_id.get()
                            on:input=move |ev| set_new_id.set(event_target_value(&ev))
                        />
                    </div>
                    <div class="form-group">
                        <label for="new-user-name">"Name"</label>
                        <input
                            id="new-user-name"
                            class="input"
                            prop:value=move || new_name.get()
                            on:input=move |ev| set_new_name.set(event_target_value(&ev))
                        />
                    </div>
                    <div class="form-group">
                        <label for="new-user-email">"Email"</label>
                        <input
                            id="new-user-email"
                            type="email"
                            class="input"
                            prop:value=move || new_email.get()
                            on:input=move |ev| set_new_email.set(event_target_value(&ev))
                        />
                    </div>
                    <div class="form-group">
                        <label for="new-user-password">"Password"</label>
                        <input
                            id="new-user-password"
                            type="password"
                            class="input"
                            prop:value=move || new_password.get()
                            on:input=move |ev| set_new_password.set(event_target_value(&ev))
                        />
                    </div>
                    <button
                        class="btn btn-primary"
                        prop:disabled=move || saving.get()
                        on:click=on_create
                    >
                        {move || if saving.get() { "Saving..." } else { "Create" }}
                    </button>
                </div>
            </Show>

            {move || {
                if loading.get() {
                    return view! { <p class="loading-text">"Loading users..."</p> }.into_any();
                }
                let list = users.get();
                if list.is_empty() {
                    return view! { <p class="empty-text">"No users found."</p> }.into_any();
                }
                let viewer = ctx.session.get();
                view! {
                    <table class="users-table">
                        <thead>
                            <tr>
                                <th>"Id"</th>
                                <th>"Name"</th>
                                <th>"Email"</th>
                                <th>"Role"</th>
                                <th></th>
                            </tr>
                        </thead>
                        <tbody>
                            {list
                                .into_iter()
                                .map(|record| {
                                    let can_view = viewer
                                        .as_ref()
                                        .is_some_and(|v| may_view_timetable(v, &record));
                                    let can_delete = viewer
                                        .as_ref()
                                        .is_some_and(|v| may_delete(v, &record));
                                    let is_self = viewer.as_ref().is_some_and(|v| v.id == record.id);
                                    let link = timetable_link(&record.id);
                                    let target = record.clone();
                                    view! {
                                        <tr>
                                            <td>{record.id.clone()}</td>
                                            <td>{record.name.clone()}</td>
                                            <td>{record.email.clone()}</td>
                                            <td>
                                                <RoleBadge role=record.role is_self=is_self />
                                            </td>
                                            <td class="row-actions">
                                                {can_view
                                                    .then(|| {
                                                        view! {
                                                            <a href=link class="btn btn-small">
                                                                "View Timetable"
                                                            </a>
                                                        }
                                                    })}
                                                {can_delete
                                                    .then(|| {
                                                        view! {
                                                            <button
                                                                class="btn btn-small btn-danger"
                                                                on:click=move |_| on_delete(target.clone())
                                                            >
                                                                "Delete"
                                                            </button>
                                                        }
                                                    })}
                                            </td>
                                        </tr>
                                    }
                                })
                                .collect_view()}
                        </tbody>
                    </table>
                }
                    .into_any()
            }}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer(id: &str, role: Role) -> Session {
        Session {
            id: id.into(),
            name: "Viewer".into(),
            email: "v@example.com".into(),
            role,
            avatar_ref: None,
        }
    }

    fn record(id: &str, role: Role) -> UserRecord {
        UserRecord {
            id: id.into(),
            name: "Row".into(),
            email: "row@example.com".into(),
            role,
            created_at: None,
        }
    }

    #[test]
    fn test_timetable_link_encodes_id() {
        assert_eq!(timetable_link("T-1"), "/dashboard/my-timetables?teacherId=T-1");
        assert_eq!(
            timetable_link("T 1&x"),
            "/dashboard/my-timetables?teacherId=T%201%26x"
        );
    }

    #[test]
    fn test_teacher_sees_only_own_timetable() {
        let teacher = viewer("T-1", Role::Teacher);
        assert!(may_view_timetable(&teacher, &record("T-1", Role::Teacher)));
        assert!(!may_view_timetable(&teacher, &record("T-2", Role::Teacher)));
        let admin = viewer("A-1", Role::Admin);
        assert!(may_view_timetable(&admin, &record("T-2", Role::Teacher)));
    }

    #[test]
    fn test_admin_rows_have_no_timetable_link() {
        let admin = viewer("A-1", Role::Admin);
        assert!(!may_view_timetable(&admin, &record("A-2", Role::Admin)));
        assert!(!may_view_timetable(&admin, &record("A-1", Role::Admin)));
        assert!(!may_view_timetable(&viewer("T-1", Role::Teacher), &record("A-1", Role::Admin)));
    }

    #[test]
    fn test_only_admin_deletes_and_never_admins() {
        let admin = viewer("A-1", Role::Admin);
        assert!(may_delete(&admin, &record("T-2", Role::Teacher)));
        assert!(!may_delete(&admin, &record("A-2", Role::Admin)));
        assert!(!may_delete(&viewer("T-1", Role::Teacher), &record("T-2", Role::Teacher)));
    }

    #[test]
    fn test_new_user_validation() {
        let mut draft = NewUser {
            id: "T-3".into(),
            name: "Cy".into(),
            email: "cy@example.com".into(),
            password: "pw".into(),
        };
        assert!(validate(&draft).is_ok());
        draft.email = "cy".into();
        assert!(validate(&draft).is_err());
        draft.email = "cy@example.com".into();
        draft.password.clear();
        assert!(validate(&draft).is_err());
    }
}
