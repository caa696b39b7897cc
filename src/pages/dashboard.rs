use leptos::prelude::*;

use crate::app::SessionContext;
use crate::pages::users::timetable_link;

#[component]
pub fn DashboardPage() -> impl IntoView {
    let ctx = expect_context::<SessionContext>();

    view! {
        <div class="page home-page">
            <h2>
                {move || {
                    ctx.session
                        .get()
                        .map(|s| format!("Welcome, {}", s.name))
                        .unwrap_or_else(|| "Welcome".to_string())
                }}
            </h2>
            <p class="page-description">
                "Browse the generated timetables and your own weekly schedule."
            </p>

            <div class="card-grid">
                {move || {
                    ctx.session
                        .get()
                        .filter(|s| !s.is_admin())
                        .map(|s| {
                            view! {
                                <div class="card">
                                    <h3>"My Schedule"</h3>
                                    <p>"Your sessions for the week, across every section"</p>
                                    <a href=timetable_link(&s.id) class="btn btn-primary">
                                        "Open"
                                    </a>
                                </div>
                            }
                        })
                }}
                <div class="card">
                    <h3>"All Timetables"</h3>
                    <p>"The latest generated timetable, section by section"</p>
                    <a href="/dashboard/my-timetables" class="btn btn-primary">"Browse"</a>
                </div>
                <div class="card">
                    <h3>"Teachers"</h3>
                    <p>"Find a colleague and their contact details"</p>
                    <a href="/users" class="btn btn-primary">"View List"</a>
                </div>
            </div>
        </div>
    }
}
