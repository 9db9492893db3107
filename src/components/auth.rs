use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::models::{Credentials, UserRole};

const GENERIC_AUTH_ERROR: &str = "Something went wrong. Please try again.";

#[derive(Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    Login,
    Signup,
}

/// Login/signup card. Stores the access token on success and reports the
/// resolved role upward.
#[component]
pub fn AuthCard(#[prop(into)] on_logged_in: Callback<UserRole>) -> impl IntoView {
    let (mode, set_mode) = signal(AuthMode::Login);
    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (error, set_error) = signal(None::<String>);
    let (busy, set_busy) = signal(false);

    let toggle_mode = move |_| {
        set_mode.update(|m| {
            *m = match m {
                AuthMode::Login => AuthMode::Signup,
                AuthMode::Signup => AuthMode::Login,
            }
        });
        set_email.set(String::new());
        set_password.set(String::new());
        set_error.set(None);
        set_busy.set(false);
    };

    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get_untracked() {
            return;
        }
        set_error.set(None);
        set_busy.set(true);

        let creds = Credentials {
            email: email.get_untracked(),
            password: password.get_untracked(),
        };
        let login_mode = mode.get_untracked() == AuthMode::Login;

        spawn_local(async move {
            let result = if login_mode {
                api::login(&creds).await
            } else {
                api::signup(&creds).await
            };
            match result {
                Ok(token) => {
                    api::store_token(&token.access_token);
                    match api::me().await {
                        Ok(me) => {
                            set_email.set(String::new());
                            set_password.set(String::new());
                            on_logged_in.run(me.role);
                        }
                        Err(err) => {
                            log::error!("role lookup failed: {err}");
                            set_error.set(Some(auth_error_message(&err)));
                        }
                    }
                }
                Err(err) => set_error.set(Some(auth_error_message(&err))),
            }
            set_busy.set(false);
        });
    };

    view! {
        <div class="auth-wrapper">
            <div class="auth-card">
                <div class="auth-card-header">
                    <h1 class="auth-title">
                        {move || match mode.get() {
                            AuthMode::Login => "Welcome back 👋",
                            AuthMode::Signup => "Create your account",
                        }}
                    </h1>
                    <p class="auth-subtitle">
                        {move || match mode.get() {
                            AuthMode::Login => "Login to access the CA chatbot.",
                            AuthMode::Signup => "Sign up to get started.",
                        }}
                    </p>
                </div>

                <form class="auth-form" on:submit=on_submit>
                    <label class="field">
                        <span class="field-label">"Email"</span>
                        <input
                            class="field-input"
                            type="email"
                            placeholder="you@example.com"
                            prop:value=email
                            required
                            on:input=move |ev| {
                                set_email.set(event_target_value(&ev));
                                set_error.set(None);
                            }
                        />
                    </label>

                    <label class="field">
                        <span class="field-label">"Password"</span>
                        <input
                            class="field-input"
                            type="password"
                            placeholder="••••••••••"
                            prop:value=password
                            required
                            on:input=move |ev| {
                                set_password.set(event_target_value(&ev));
                                set_error.set(None);
                            }
                        />
                    </label>

                    {move || {
                        error.get().map(|err| view! { <div class="auth-error">{err}</div> })
                    }}

                    <button
                        type="submit"
                        class="btn btn-primary auth-submit"
                        disabled=busy
                    >
                        {move || {
                            if busy.get() {
                                "Please wait…"
                            } else if mode.get() == AuthMode::Login {
                                "Login"
                            } else {
                                "Create account"
                            }
                        }}
                    </button>
                </form>

                <div class="auth-footer">
                    <span>
                        {move || match mode.get() {
                            AuthMode::Login => "Don't have an account?",
                            AuthMode::Signup => "Already have an account?",
                        }}
                    </span>
                    <button type="button" class="link" on:click=toggle_mode>
                        {move || match mode.get() {
                            AuthMode::Login => "Sign up",
                            AuthMode::Signup => "Login",
                        }}
                    </button>
                </div>
            </div>
        </div>
    }
}

fn auth_error_message(err: &api::ApiError) -> String {
    err.detail()
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_AUTH_ERROR.to_string())
}
