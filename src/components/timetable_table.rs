use leptos::prelude::*;

use crate::presenter::SectionView;

#[component]
pub fn TimetableTable(#[prop(into)] model: Signal<Option<SectionView>>) -> impl IntoView {
    move || match model.get() {
        None => ().into_any(),
        Some(SectionView::Empty { section, message }) => view! {
            <div class="timetable-empty" data-section=section>
                <p>{message}</p>
            </div>
        }
        .into_any(),
        Some(SectionView::Table {
            section,
            columns,
            rows,
        }) => view! {
            <div class="timetable-wrapper">
                <h3 class="timetable-title">{section}</h3>
                <table class="timetable">
                    <thead>
                        <tr>
                            {columns
                                .into_iter()
                                .map(|c| view! { <th>{c}</th> })
                                .collect_view()}
                        </tr>
                    </thead>
                    <tbody>
                        {rows
                            .into_iter()
                            .map(|row| {
                                view! {
                                    <tr>
                                        {row
                                            .into_iter()
                                            .map(|cell| {
                                                view! {
                                                    <td class="timetable-cell">{cell}</td>
                                                }
                                            })
                                            .collect_view()}
                                    </tr>
                                }
                            })
                            .collect_view()}
                    </tbody>
                </table>
            </div>
        }
        .into_any(),
    }
}
