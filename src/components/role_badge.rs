use leptos::prelude::*;

use crate::session::Role;

#[component]
pub fn RoleBadge(
    role: Role,
    /// Marks the badge of the signed-in identity
    #[prop(optional)]
    is_self: bool,
) -> impl IntoView {
    let class = match role {
        Role::Admin => "role-badge role-admin",
        Role::Teacher => "role-badge role-teacher",
    };

    view! {
        <span class=class>
            {role.label()}
            {is_self.then(|| view! { <span class="role-self">" (you)"</span> })}
        </span>
    }
}
