use leptos::prelude::*;

use crate::app::SessionContext;
use crate::components::role_badge::RoleBadge;
use crate::config::AppConfig;
use crate::guard;
use crate::pages::users::timetable_link;

#[component]
pub fn Sidebar() -> impl IntoView {
    let ctx = expect_context::<SessionContext>();
    let config = StoredValue::new(expect_context::<AppConfig>());

    let sign_out = move |_| config.with_value(|c| ctx.sign_out(c));

    view! {
        <nav class="sidebar">
            <div class="sidebar-header">
                <h1 class="sidebar-title">"Timetable Console"</h1>
                {move || {
                    ctx.session
                        .get()
                        .map(|s| {
                            view! {
                                <div class="sidebar-user">
                                    <img class="avatar" src=s.avatar_src() alt="avatar" />
                                    <p class="sidebar-subtitle">{s.name.clone()}</p>
                                </div>
                                <RoleBadge role=s.role />
                            }
                        })
                }}
            </div>
            <ul class="nav-list">
                {move || {
                    ctx.session
                        .get()
                        .map(|s| {
                            let admin = s.is_admin();
                            view! {
                                <li class="nav-item">
                                    <a href=guard::role_home(s.role) class="nav-link">
                                        "Home"
                                    </a>
                                </li>
                                <li class="nav-item">
                                    <a href="/dashboard/my-timetables" class="nav-link">
                                        "Timetables"
                                    </a>
                                </li>
                                {(!admin)
                                    .then(|| {
                                        let own = timetable_link(&s.id);
                                        view! {
                                            <li class="nav-item">
                                                <a href=own class="nav-link">
                                                    "My Schedule"
                                                </a>
                                            </li>
                                        }
                                    })}
                                <li class="nav-item">
                                    <a href="/users" class="nav-link">
                                        {if admin { "Users" } else { "Teachers" }}
                                    </a>
                                </li>
                                <li class="nav-item">
                                    <a href="/profile" class="nav-link">"Profile"</a>
                                </li>
                            }
                        })
                }}
            </ul>
            <div class="sidebar-footer">
                <button class="btn btn-secondary" on:click=sign_out>
                    "Sign out"
                </button>
            </div>
        </nav>
    }
}
