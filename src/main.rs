mod api;
mod components;
mod dialogue;
mod models;
mod playback;
mod session;
mod sources;
mod state;
mod voice;

use leptos::mount::mount_to_body;
use leptos::prelude::*;
use leptos::task::spawn_local;

use components::admin::AdminPanel;
use components::auth::AuthCard;
use components::chat::ChatCard;
use models::UserRole;

/// Root application component: validates any stored token, then gates the
/// shell on the resolved role.
#[component]
fn App() -> impl IntoView {
    let (role, set_role) = signal(None::<UserRole>);
    let (checking, set_checking) = signal(true);

    // Validate a stored token on mount; invalid tokens are dropped.
    spawn_local(async move {
        if api::stored_token().is_some() {
            match api::me().await {
                Ok(me) => set_role.set(Some(me.role)),
                Err(err) => {
                    log::debug!("stored token rejected: {err}");
                    api::clear_token();
                }
            }
        }
        set_checking.set(false);
    });

    let logout = move |_| {
        api::clear_token();
        set_role.set(None);
    };

    view! {
        {move || {
            if checking.get() {
                view! {
                    <div class="app-full-center app-bg">
                        <div class="loader"></div>
                        <p class="loader-text">"Loading your CA assistant…"</p>
                    </div>
                }
                    .into_any()
            } else {
                match role.get() {
                    None => {
                        view! {
                            <div class="app-bg">
                                <AuthCard on_logged_in=move |r: UserRole| set_role.set(Some(r)) />
                            </div>
                        }
                            .into_any()
                    }
                    Some(current) => {
                        view! {
                            <div class="app-root app-bg">
                                <header class="app-header">
                                    <div class="app-header-left">
                                        <div class="app-logo">"CA RAG Tutor"</div>
                                        <div class="app-subtitle">
                                            "Smart Q&A assistant for CA students"
                                        </div>
                                    </div>
                                    <div class="app-header-right">
                                        <span class="pill pill-ghost">
                                            "Role: "
                                            <strong>
                                                {match current {
                                                    UserRole::Admin => "ADMIN",
                                                    UserRole::Student => "STUDENT",
                                                }}
                                            </strong>
                                        </span>
                                        <button class="btn btn-ghost" on:click=logout>
                                            "Logout"
                                        </button>
                                    </div>
                                </header>
                                <div class="app-main-layout">
                                    {(current == UserRole::Admin)
                                        .then(|| {
                                            view! {
                                                <aside class="app-sidebar">
                                                    <AdminPanel />
                                                </aside>
                                            }
                                        })}
                                    <main class="app-main">
                                        <ChatCard />
                                    </main>
                                </div>
                            </div>
                        }
                            .into_any()
                    }
                }
            }
        }}
    }
}

fn main() {
    console_log::init_with_level(log::Level::Debug).expect("Failed to init logger");
    mount_to_body(App);
}
