use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;
use web_sys::{File, FormData, HtmlInputElement, Url};

use crate::api;
use crate::models::DocumentInfo;

const MAX_FILE_MB: f64 = 50.0;

/// Document-upload panel for admins: pick a PDF, preview it, upload it for
/// indexing, and list what the backend already holds.
#[component]
pub fn AdminPanel() -> impl IntoView {
    let (file, set_file) = signal_local(None::<File>);
    let (file_url, set_file_url) = signal(None::<String>);
    let (status, set_status) = signal(String::new());
    let (docs, set_docs) = signal(Vec::<DocumentInfo>::new());
    let (loading_docs, set_loading_docs) = signal(false);
    let (uploading, set_uploading) = signal(false);

    let fetch_docs = move || {
        set_loading_docs.set(true);
        spawn_local(async move {
            match api::fetch_documents().await {
                Ok(list) => set_docs.set(list),
                Err(err) => {
                    log::error!("failed to load documents: {err}");
                    set_status.set("Failed to load documents.".to_string());
                }
            }
            set_loading_docs.set(false);
        });
    };
    fetch_docs();

    let clear_selection = move || {
        set_file.set(None);
        set_file_url.set(None);
    };

    let on_file_change = move |ev: ev::Event| {
        set_status.set(String::new());
        let input: HtmlInputElement = match ev.target().and_then(|t| t.dyn_into().ok()) {
            Some(input) => input,
            None => return,
        };
        let Some(picked) = input.files().and_then(|files| files.get(0)) else {
            clear_selection();
            return;
        };

        if !picked.name().to_lowercase().ends_with(".pdf") {
            set_status.set("Only PDF files are allowed.".to_string());
            return;
        }
        if picked.size() > MAX_FILE_MB * 1024.0 * 1024.0 {
            set_status.set(format!("File too large. Max allowed: {MAX_FILE_MB} MB"));
            return;
        }

        set_file_url.set(Url::create_object_url_with_blob(&picked).ok());
        set_file.set(Some(picked));
    };

    let on_upload = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        let Some(picked) = file.get_untracked() else {
            set_status.set("Please select a PDF first.".to_string());
            return;
        };
        let Ok(form) = FormData::new() else {
            return;
        };
        if form.append_with_blob("file", &picked).is_err() {
            return;
        }

        set_uploading.set(true);
        set_status.set(String::new());
        spawn_local(async move {
            match api::upload_pdf(form).await {
                Ok(uploaded) => {
                    set_status.set(format!(
                        "Uploaded: {} ({} chunks)",
                        uploaded.filename, uploaded.chunks
                    ));
                    clear_selection();
                    fetch_docs();
                }
                Err(err) => {
                    set_status.set(
                        err.detail()
                            .map(str::to_string)
                            .unwrap_or_else(|| "Upload failed.".to_string()),
                    );
                }
            }
            set_uploading.set(false);
        });
    };

    view! {
        <div class="admin-panel">
            <div class="admin-panel-section">
                <h3 class="admin-title">"Admin Controls"</h3>
                <p class="admin-subtitle">
                    "Upload CA study PDFs. They will be indexed and used by the chatbot."
                </p>

                <form class="admin-upload-form" on:submit=on_upload>
                    <div class="file-row">
                        <input
                            type="file"
                            accept="application/pdf"
                            disabled=uploading
                            on:change=on_file_change
                        />
                        <button class="btn btn-secondary" disabled=uploading>
                            {move || if uploading.get() { "Uploading…" } else { "Upload & Index" }}
                        </button>
                        {move || {
                            file.with(Option::is_some)
                                .then(|| {
                                    view! {
                                        <button
                                            type="button"
                                            class="btn btn-ghost"
                                            disabled=uploading
                                            on:click=move |_| clear_selection()
                                        >
                                            "Remove"
                                        </button>
                                    }
                                })
                        }}
                    </div>

                    {move || {
                        file.get()
                            .map(|picked| {
                                view! {
                                    <div class="file-preview-box">
                                        <div class="file-info">
                                            <strong>{picked.name()}</strong>
                                            <div class="file-size">
                                                {human_file_size(picked.size())}
                                            </div>
                                        </div>
                                        {file_url
                                            .get()
                                            .map(|url| {
                                                view! {
                                                    <div class="file-preview-frame">
                                                        <embed
                                                            src=url
                                                            type="application/pdf"
                                                            width="100%"
                                                            height="240px"
                                                        />
                                                    </div>
                                                }
                                            })}
                                    </div>
                                }
                            })
                    }}
                </form>

                {move || {
                    let message = status.get();
                    (!message.is_empty())
                        .then(|| view! { <div class="admin-status">{message}</div> })
                }}
            </div>

            <div class="admin-panel-section admin-docs-section">
                <h4 class="admin-docs-title">"Indexed Documents"</h4>
                {move || {
                    if loading_docs.get() {
                        view! { <div>"Loading..."</div> }.into_any()
                    } else if docs.with(Vec::is_empty) {
                        view! { <div>"No documents uploaded yet."</div> }.into_any()
                    } else {
                        view! {
                            <div class="admin-docs-list">
                                <For
                                    each=move || docs.get()
                                    key=|doc| doc.id.clone()
                                    let:doc
                                >
                                    <div class="admin-doc-item">
                                        <div class="admin-doc-name">{doc.filename.clone()}</div>
                                        <div class="admin-doc-meta">
                                            <span>{format!("{} chunks", doc.chunks)}</span>
                                            <span>
                                                {format!(
                                                    "By: {}",
                                                    doc.uploaded_by.clone().unwrap_or_else(|| "admin".to_string()),
                                                )}
                                            </span>
                                            <span>{doc.uploaded_at.clone()}</span>
                                        </div>
                                    </div>
                                </For>
                            </div>
                        }
                            .into_any()
                    }
                }}
            </div>
        </div>
    }
}

/// Human-readable size for the file preview.
fn human_file_size(bytes: f64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes <= 0.0 {
        return "0 B".to_string();
    }
    let exponent = (bytes.ln() / 1024_f64.ln()).floor().min(3.0).max(0.0) as i32;
    format!(
        "{:.2} {}",
        bytes / 1024_f64.powi(exponent),
        UNITS[exponent as usize]
    )
}

#[cfg(test)]
mod tests {
    use super::human_file_size;

    #[test]
    fn test_zero_bytes() {
        assert_eq!(human_file_size(0.0), "0 B");
    }

    #[test]
    fn test_bytes() {
        assert_eq!(human_file_size(512.0), "512.00 B");
    }

    #[test]
    fn test_kilobytes() {
        assert_eq!(human_file_size(2048.0), "2.00 KB");
    }

    #[test]
    fn test_megabytes() {
        assert_eq!(human_file_size(5.0 * 1024.0 * 1024.0), "5.00 MB");
    }
}
