use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use web_sys::{ScrollBehavior, ScrollIntoViewOptions};

use crate::dialogue::{self, DialogueLine};
use crate::models::{AnswerMode, Message, Source};
use crate::sources;
use crate::state::ChatState;

/// Pixels from the bottom within which the view counts as "at the latest".
const NEAR_BOTTOM_PX: i32 = 120;

/// The conversational chat surface. Owns the session state for as long as it
/// stays mounted.
#[component]
pub fn ChatCard() -> impl IntoView {
    let state = ChatState::provide();

    let container_ref = NodeRef::<html::Div>::new();
    let bottom_ref = NodeRef::<html::Div>::new();
    let (scroll_visible, set_scroll_visible) = signal(false);

    let scroll_to_latest = move || {
        if let Some(el) = bottom_ref.get_untracked() {
            let options = ScrollIntoViewOptions::new();
            options.set_behavior(ScrollBehavior::Smooth);
            el.scroll_into_view_with_scroll_into_view_options(&options);
        }
    };

    // New turns pull the viewport back to the latest message.
    Effect::new(move |_| {
        if state.messages.with(|msgs| !msgs.is_empty()) {
            scroll_to_latest();
        }
    });

    let on_scroll = move |_| {
        if let Some(el) = container_ref.get_untracked() {
            let near_bottom =
                el.scroll_height() - el.scroll_top() - el.client_height() < NEAR_BOTTOM_PX;
            set_scroll_visible.set(!near_bottom);
        }
    };

    view! {
        <div class="chat-card">
            <div class="chat-card-header">
                <div class="header-left">
                    <h2 class="chat-title">"CA Tutor — Ask your CA doubts"</h2>
                    <p class="chat-subtitle">
                        "Grounded answers from study materials — concise, exam-focused."
                    </p>
                </div>
                <div class="chat-header-actions">
                    <div class="chat-mode-toggle">
                        <button
                            type="button"
                            class="chat-mode-btn"
                            class:chat-mode-btn-active=move || state.mode.get() == AnswerMode::Qa
                            on:click=move |_| state.set_mode.set(AnswerMode::Qa)
                        >
                            "Simple Q&A"
                        </button>
                        <button
                            type="button"
                            class="chat-mode-btn"
                            class:chat-mode-btn-active=move || {
                                state.mode.get() == AnswerMode::Discussion
                            }
                            on:click=move |_| state.set_mode.set(AnswerMode::Discussion)
                        >
                            "Discussion"
                        </button>
                    </div>
                    <button class="btn btn-ghost btn-sm" on:click=move |_| state.clear()>
                        "Clear"
                    </button>
                </div>
            </div>

            <div class="chat-messages" node_ref=container_ref on:scroll=on_scroll>
                {move || {
                    state
                        .messages
                        .with(|msgs| msgs.is_empty())
                        .then(|| {
                            view! {
                                <div class="chat-empty">
                                    <p class="empty-title">"Start by asking a CA question"</p>
                                    <p class="empty-sub">"Type your question and press Send."</p>
                                </div>
                            }
                        })
                }}
                <For
                    each={move || state.messages.get().into_iter().enumerate().collect::<Vec<_>>()}
                    key=|(index, _)| *index
                    let:entry
                >
                    <MessageRow index=entry.0 message=entry.1 />
                </For>
                {move || {
                    state
                        .pending
                        .get()
                        .then(|| {
                            view! {
                                <div class="chat-bubble-row chat-bubble-row-assistant">
                                    <div class="chat-avatar chat-avatar-active"></div>
                                    <div class="chat-bubble chat-bubble-assistant">
                                        <div class="typing-dots">
                                            <span></span>
                                            <span></span>
                                            <span></span>
                                        </div>
                                    </div>
                                </div>
                            }
                        })
                }}
                <div node_ref=bottom_ref></div>
            </div>

            <div class="chat-input-bar">
                <input
                    class="chat-input"
                    prop:value=state.input
                    placeholder="Type your CA question here… (e.g. 'Explain Ind AS 7 briefly')"
                    on:input=move |ev| state.set_input.set(event_target_value(&ev))
                    on:keydown=move |ev: ev::KeyboardEvent| {
                        if ev.key() == "Enter" && !ev.shift_key() {
                            ev.prevent_default();
                            state.submit();
                        }
                    }
                />
                {state
                    .stt_available
                    .then(|| {
                        view! {
                            <button
                                type="button"
                                class="btn-icon"
                                title="Voice input"
                                on:click=move |_| state.start_voice_input()
                            >
                                "🎙"
                            </button>
                        }
                    })}
                <button
                    type="button"
                    class="btn btn-primary"
                    on:click=move |_| state.submit()
                    disabled=move || {
                        state.pending.get() || state.input.with(|i| i.trim().is_empty())
                    }
                >
                    {move || if state.pending.get() { "Thinking…" } else { "Send" }}
                </button>
                {move || {
                    scroll_visible
                        .get()
                        .then(|| {
                            view! {
                                <button
                                    type="button"
                                    class="scroll-bottom-btn"
                                    on:click=move |_| scroll_to_latest()
                                >
                                    "Jump to latest"
                                </button>
                            }
                        })
                }}
            </div>
        </div>
    }
}

/// One transcript turn: bubble, actions, and (for assistant turns) the
/// citations panel.
#[component]
fn MessageRow(index: usize, message: Message) -> impl IntoView {
    let state = expect_context::<ChatState>();

    let is_assistant = message.role.is_assistant();
    let row_class = if is_assistant {
        "chat-bubble-row chat-bubble-row-assistant"
    } else {
        "chat-bubble-row chat-bubble-row-user"
    };
    let bubble_class = if is_assistant {
        "chat-bubble chat-bubble-assistant"
    } else {
        "chat-bubble chat-bubble-user"
    };

    let dialogue_lines = (is_assistant && dialogue::is_dialogue(&message.content))
        .then(|| dialogue::parse_lines(&message.content));

    let speak_text = message.content.clone();
    let copy_text = message.content.clone();
    let source_list = message.sources.clone();
    let has_sources = !message.sources.is_empty();

    let speak_label = move || {
        let playback = state.playback.get();
        if playback.is_speaking(index) {
            "Pause"
        } else if playback.is_paused(index) {
            "Resume"
        } else {
            "Speak"
        }
    };

    view! {
        <div class=row_class>
            {is_assistant.then(|| view! { <div class="chat-avatar"></div> })}
            <div class=bubble_class>
                <div class="chat-bubble-role">
                    {if is_assistant { "Tutor" } else { "You" }}
                </div>
                {match dialogue_lines {
                    Some(lines) => view! { <DialogueBlock lines=lines /> }.into_any(),
                    None => {
                        view! {
                            <div class="chat-bubble-content">{message.content.clone()}</div>
                        }
                            .into_any()
                    }
                }}
                <div class="chat-bubble-footer">
                    <div class="chat-bubble-time">{message.ts.clone()}</div>
                    {is_assistant
                        .then(|| {
                            view! {
                                <div class="message-actions">
                                    {state
                                        .tts_available
                                        .then(|| {
                                            view! {
                                                <button
                                                    class="action-btn"
                                                    on:click=move |_| {
                                                        state.toggle_speak(index, &speak_text)
                                                    }
                                                >
                                                    {speak_label}
                                                </button>
                                                <button
                                                    class="action-btn"
                                                    on:click=move |_| state.stop_speech()
                                                >
                                                    "Stop"
                                                </button>
                                            }
                                        })}
                                    <button
                                        class="action-btn"
                                        on:click=move |_| state.toggle_sources(index)
                                    >
                                        {move || {
                                            if state.sources_open(index) {
                                                "Hide sources"
                                            } else {
                                                "Sources"
                                            }
                                        }}
                                    </button>
                                    <button
                                        class="action-btn"
                                        on:click=move |_| state.copy_message(index, &copy_text)
                                    >
                                        {move || {
                                            if state.copied.get() == Some(index) {
                                                "Copied"
                                            } else {
                                                "Copy"
                                            }
                                        }}
                                    </button>
                                    <button
                                        class="action-btn"
                                        on:click=move |_| state.regenerate()
                                    >
                                        "Regenerate"
                                    </button>
                                </div>
                            }
                        })}
                </div>
                {move || {
                    (has_sources && state.sources_open(index))
                        .then(|| view! { <SourcesPanel sources=source_list.clone() /> })
                }}
            </div>
        </div>
    }
}

/// A discussion-mode answer rendered as labeled speaker lines.
#[component]
fn DialogueBlock(lines: Vec<DialogueLine>) -> impl IntoView {
    view! {
        <div class="dialogue-block">
            {lines
                .into_iter()
                .map(|line| {
                    let class = match line.speaker {
                        Some(dialogue::Speaker::A) => "dialogue-line dialogue-line-a",
                        Some(dialogue::Speaker::B) => "dialogue-line dialogue-line-b",
                        None => "dialogue-line dialogue-line-neutral",
                    };
                    let label = line.speaker.map(|s| s.label()).unwrap_or("");
                    view! {
                        <div class=class>
                            <span class="dialogue-speaker">{label}</span>
                            <span class="dialogue-text">{line.text}</span>
                        </div>
                    }
                })
                .collect_view()}
        </div>
    }
}

/// Citation records for one assistant turn.
#[component]
fn SourcesPanel(sources: Vec<Source>) -> impl IntoView {
    view! {
        <div class="chat-sources">
            <div class="chat-sources-title">"Sources used"</div>
            <ul class="chat-sources-list">
                {sources
                    .into_iter()
                    .map(|source| {
                        let title = sources::title(&source).to_string();
                        let chapter_topic = sources::chapter_topic(&source);
                        let page = sources::page_label(&source);
                        let score = sources::score_label(&source);
                        let note = source.note.clone();
                        let csv_url = source.table_csv_url.clone();
                        let thumb_url = source.thumb_url.clone();
                        view! {
                            <li class="chat-source-item">
                                <div class="chat-source-title">{title}</div>
                                <div class="chat-source-meta">
                                    {chapter_topic
                                        .map(|label| {
                                            view! {
                                                <span class="chat-source-meta-item">{label}</span>
                                            }
                                        })}
                                    {page
                                        .map(|label| {
                                            view! {
                                                <span class="chat-source-meta-item">{label}</span>
                                            }
                                        })}
                                    {score
                                        .map(|label| {
                                            view! {
                                                <span class="chat-source-meta-item">{label}</span>
                                            }
                                        })}
                                    {note
                                        .map(|note| {
                                            view! {
                                                <span class="chat-source-meta-item">{note}</span>
                                            }
                                        })}
                                    {csv_url
                                        .map(|url| {
                                            view! {
                                                <span class="chat-source-meta-item">
                                                    <a href=url target="_blank" rel="noreferrer">
                                                        "Open table CSV"
                                                    </a>
                                                </span>
                                            }
                                        })}
                                    {thumb_url
                                        .map(|url| {
                                            view! {
                                                <span class="chat-source-meta-item">
                                                    <img
                                                        class="chat-source-thumb"
                                                        src=url
                                                        alt="Figure thumbnail"
                                                    />
                                                </span>
                                            }
                                        })}
                                </div>
                            </li>
                        }
                    })
                    .collect_view()}
            </ul>
        </div>
    }
}
