use leptos::prelude::*;

#[component]
pub fn AdminHomePage() -> impl IntoView {
    view! {
        <div class="page home-page">
            <h2>"Administration"</h2>
            <p class="page-description">
                "Generate timetables with the scheduling service and manage who can sign in."
            </p>

            <div class="card-grid">
                <div class="card">
                    <h3>"Timetables"</h3>
                    <p>"Run a new generation, reload the latest result and export it"</p>
                    <a href="/dashboard/my-timetables" class="btn btn-primary">"Open"</a>
                </div>
                <div class="card">
                    <h3>"Users"</h3>
                    <p>"Add or remove teacher accounts and open their schedules"</p>
                    <a href="/users" class="btn btn-primary">"Manage"</a>
                </div>
                <div class="card">
                    <h3>"Profile"</h3>
                    <p>"Update your display name and email"</p>
                    <a href="/profile" class="btn btn-primary">"Edit"</a>
                </div>
            </div>

            <div class="how-it-works">
                <h3>"Workflow"</h3>
                <div class="steps">
                    <div class="step">
                        <span class="step-number">"1"</span>
                        <div class="step-content">
                            <strong>"Generate"</strong>
                            <p>"The service builds a fresh timetable from its current data"</p>
                        </div>
                    </div>
                    <div class="step">
                        <span class="step-number">"2"</span>
                        <div class="step-content">
                            <strong>"Review"</strong>
                            <p>"Step through each section and teacher schedule"</p>
                        </div>
                    </div>
                    <div class="step">
                        <span class="step-number">"3"</span>
                        <div class="step-content">
                            <strong>"Export"</strong>
                            <p>"Save the result as CSV or as an XLSX workbook"</p>
                        </div>
                    </div>
                </div>
            </div>
        </div>
    }
}
