use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use wasm_bindgen_futures::spawn_local;

use crate::api::ApiClient;
use crate::components::section_tabs::SectionTabs;
use crate::components::timetable_table::TimetableTable;
use crate::config::AppConfig;
use crate::presenter::{self, SectionView};
use crate::transfer::{self, BrowserSink, ExportTarget};
use crate::workflow::{self, Workflow, WorkflowHost, WorkflowKind, WorkflowState};

const IDENTITY_PARAM: &str = "teacherId";

/// Signal-backed workflow container. Writes are skipped once the page is gone.
#[derive(Clone, Copy)]
struct WorkflowSignal(RwSignal<Workflow>);

impl WorkflowHost for WorkflowSignal {
    fn with_workflow<R>(&self, f: impl FnOnce(&mut Workflow) -> R) -> Option<R> {
        self.0.try_update(f)
    }
}

#[component]
pub fn TimetablesPage() -> impl IntoView {
    let config = StoredValue::new(expect_context::<AppConfig>());
    let flow = WorkflowSignal(RwSignal::new(Workflow::default()));
    let query = use_query_map();

    let (export_error, set_export_error) = signal::<Option<String>>(None);
    let (is_exporting, set_is_exporting) = signal(false);

    let start = move |kind: WorkflowKind| {
        let client = ApiClient::from_config(&config.get_value());
        spawn_local(async move {
            workflow::run(&flow, &client, kind).await;
        });
    };

    // Load on mount and whenever the identity parameter changes
    Effect::new(move |_| {
        let identity = query.with(|q| q.get(IDENTITY_PARAM));
        start(workflow::entry_trigger(identity.as_deref()));
    });

    let export = move |target: ExportTarget| {
        set_export_error.set(None);
        set_is_exporting.set(true);
        let client = ApiClient::from_config(&config.get_value());
        spawn_local(async move {
            let name = target.suggested_name();
            if let Err(e) = transfer::save_as(&client, &BrowserSink, target.source_ref(), &name).await {
                set_export_error.set(Some(e.to_string()));
            }
            set_is_exporting.set(false);
        });
    };

    let export_csv = move |_| {
        let target = flow
            .0
            .with_untracked(|w| w.download_ref().map(|r| ExportTarget::Csv(r.to_string())));
        match target {
            Some(target) => export(target),
            None => set_export_error.set(Some(
                "Generate or load a timetable before exporting CSV".to_string(),
            )),
        }
    };

    let is_requesting = Signal::derive(move || flow.0.with(|w| w.is_requesting()));
    let is_generating = move || {
        flow
            .0
            .with(|w| matches!(w.state(), WorkflowState::Requesting(WorkflowKind::Generate)))
    };
    let failure = move || flow.0.with(|w| w.failure().map(|f| f.to_string()));
    let has_dataset = move || flow.0.with(|w| w.dataset().is_some());

    let names = Signal::derive(move || {
        flow.0.with(|w| {
            w.dataset()
                .map(|d| d.section_names().map(str::to_string).collect::<Vec<_>>())
                .unwrap_or_default()
        })
    });
    let active = Signal::derive(move || flow.0.with(|w| w.active_section().map(str::to_string)));
    let tabs_enabled = Signal::derive(move || {
        flow.0.with(|w| matches!(w.state(), WorkflowState::Loaded))
    });
    let section_view = Signal::derive(move || -> Option<SectionView> {
        flow.0.with(|w| {
            let dataset = w.dataset()?;
            let active = w.active_section()?;
            Some(presenter::present(dataset, active))
        })
    });
    let on_select = Callback::new(move |name: String| {
        flow.0.update(|w| w.select_section(&name));
    });

    view! {
        <div class="page timetables-page">
            <div class="page-header">
                <h2>"Timetables"</h2>
                <div class="toolbar">
                    <button
                        class="btn btn-primary"
                        prop:disabled=move || is_requesting.get()
                        on:click=move |_| start(WorkflowKind::Generate)
                    >
                        {move || if is_generating() { "Generating..." } else { "New Timetable" }}
                    </button>
                    <button
                        class="btn btn-secondary"
                        prop:disabled=move || is_requesting.get()
                        on:click=move |_| start(WorkflowKind::LoadLatest)
                    >
                        "Load Latest"
                    </button>
                    <button
                        class="btn btn-secondary"
                        prop:disabled=move || is_exporting.get()
                        on:click=export_csv
                    >
                        "Export CSV"
                    </button>
                    <button
                        class="btn btn-secondary"
                        prop:disabled=move || is_exporting.get()
                        on:click=move |_| export(ExportTarget::Xlsx)
                    >
                        "Export XLSX"
                    </button>
                </div>
            </div>

            {move || failure().map(|text| view! { <div class="error-banner">{text}</div> })}
            <Show when=move || export_error.get().is_some()>
                <div class="error-banner">{move || export_error.get().unwrap_or_default()}</div>
            </Show>

            {move || {
                if is_requesting.get() {
                    view! {
                        <div class="loading-state">
                            <div class="spinner"></div>
                            <p>"Loading timetable..."</p>
                        </div>
                    }
                        .into_any()
                } else if !has_dataset() {
                    view! {
                        <div class="empty-state">
                            <p>"No timetable loaded yet."</p>
                        </div>
                    }
                        .into_any()
                } else {
                    ().into_any()
                }
            }}

            <SectionTabs names=names active=active enabled=tabs_enabled on_select=on_select />
            <TimetableTable model=section_view />
        </div>
    }
}
