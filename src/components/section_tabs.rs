use leptos::prelude::*;

/// One tab per dataset section. Selection is only offered while `enabled`.
#[component]
pub fn SectionTabs(
    #[prop(into)] names: Signal<Vec<String>>,
    #[prop(into)] active: Signal<Option<String>>,
    #[prop(into)] enabled: Signal<bool>,
    on_select: Callback<String>,
) -> impl IntoView {
    view! {
        <div class="section-tabs" role="tablist">
            <For
                each=move || names.get()
                key=|name| name.clone()
                children=move |name| {
                    let label = name.clone();
                    let is_active = {
                        let name = name.clone();
                        move || active.get().as_deref() == Some(name.as_str())
                    };
                    view! {
                        <button
                            class="section-tab"
                            class:active=is_active
                            prop:disabled=move || !enabled.get()
                            on:click=move |_| on_select.run(name.clone())
                        >
                            {label}
                        </button>
                    }
                }
            />
        </div>
    }
}
