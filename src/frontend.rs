use std::rc::Rc;

use gloo_file::futures::read_as_bytes;
use gloo_file::{File, FileList};
use gloo_timers::future::TimeoutFuture;
use leptos::*;
use leptos_meta::{provide_meta_context, Title};
use leptos_router::{use_params_map, Redirect, Route, Router, Routes, A};
use wasm_bindgen::prelude::*;
use web_sys::DragEvent;

use crate::api::preview_route;
use crate::format::format_size;
use crate::http::{load_host_config, HttpFileApi};
use crate::registry::filter_records;
use crate::transient::{object_url, save_as};
use crate::upload::{validate_name, SUPPORTED_EXTENSIONS};
use crate::{
    logger, FileApi, FileError, FileRecord, FileRegistry, HostConfig, Preview, PreviewKind,
    PreviewResolver, UploadController, UploadOutcome, UploadSelection,
};

const NOTICE_MS: u32 = 4_000;

#[derive(Clone)]
struct AppContext {
    api: HttpFileApi,
    debug_mode: bool,
}

#[component]
pub fn App(config: HostConfig) -> impl IntoView {
    provide_meta_context();
    provide_context(AppContext {
        api: HttpFileApi::new(&config.api_base),
        debug_mode: config.debug_mode,
    });

    view! {
        <StyleProvider />
        <Title text="filedeck" />
        <Router>
            <div class="app">
                <div class="header-section border-container">
                    <div style="display: flex; justify-content: space-between; align-items: center;">
                        <h1 style="color: #cdd6f4; margin: 0; font-size: 2.2rem; font-weight: 500;">
                            "filedeck"
                        </h1>
                        <nav style="display: flex; gap: 10px;">
                            <A href="/" class="nav-btn border-container" exact=true>"files"</A>
                            <A href="/upload" class="nav-btn border-container">"upload"</A>
                        </nav>
                    </div>
                </div>
                <main>
                    <Routes>
                        <Route path="/" view=FilesPage />
                        <Route path="/upload" view=UploadPage />
                        <Route path="/preview/:filename" view=PreviewPage />
                        <Route path="/*any" view=|| view! { <Redirect path="/" /> } />
                    </Routes>
                </main>
            </div>
        </Router>
    }
}

#[component]
fn FilesPage() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let debug_mode = ctx.debug_mode;
    let registry = Rc::new(FileRegistry::new(ctx.api));

    let (files, set_files) = create_signal(Vec::<FileRecord>::new());
    let (is_loading, set_is_loading) = create_signal(true);
    let (load_error, set_load_error) = create_signal(None::<String>);
    let (search_term, set_search_term) = create_signal(String::new());
    let (notice, set_notice) = create_signal(None::<String>);
    let (to_delete, set_to_delete) = create_signal(None::<FileRecord>);
    let (delete_error, set_delete_error) = create_signal(None::<String>);
    let (is_deleting, set_is_deleting) = create_signal(false);

    {
        let registry = registry.clone();
        spawn_local(async move {
            match registry.refresh().await {
                Ok(records) => {
                    set_files.set(records);
                    set_load_error.set(None);
                }
                Err(err) => set_load_error.set(Some(err.user_message())),
            }
            set_is_loading.set(false);
        });
    }

    let filtered_files =
        create_memo(move |_| files.with(|files| filter_records(files, &search_term.get())));

    let on_download = {
        let registry = registry.clone();
        Callback::new(move |filename: String| {
            let registry = registry.clone();
            spawn_local(async move {
                match registry.download(&filename).await {
                    Ok(content) => {
                        if let Err(e) = save_as(&content.bytes, &content.content_type, &filename) {
                            log::error!("saving {} failed: {}", filename, e);
                            set_notice.set(Some(format!("Could not save \"{}\".", filename)));
                        }
                    }
                    Err(err) => set_notice.set(Some(err.user_message())),
                }
            });
        })
    };

    let on_delete_request = Callback::new(move |record: FileRecord| {
        set_delete_error.set(None);
        set_to_delete.set(Some(record));
    });

    let on_delete_confirm = {
        let registry = registry.clone();
        move |_: web_sys::MouseEvent| {
            let Some(record) = to_delete.get_untracked() else {
                return;
            };
            let registry = registry.clone();
            set_is_deleting.set(true);
            spawn_local(async move {
                match registry.delete(&record.filename).await {
                    Ok(_) => {
                        set_files.set(registry.records());
                        set_to_delete.set(None);
                    }
                    Err(err) => set_delete_error.set(Some(err.user_message())),
                }
                set_is_deleting.set(false);
            });
        }
    };

    view! {
        <div class="main-grid">
            <div class="search-section border-container">
                <input
                    type="text"
                    class="search-input border-container"
                    placeholder="search files..."
                    prop:value=search_term
                    on:input=move |ev| set_search_term.set(event_target_value(&ev))
                />
                <div style="color: #6c7086; font-size: 12px; margin-top: 8px;">
                    "use # to filter by type"
                </div>
            </div>

            <div class="files-section border-container">
                <Show when=move || notice.get().is_some()>
                    <div class="notice notice-error border-container" on:click=move |_| set_notice.set(None)>
                        {move || notice.get().unwrap_or_default()}
                    </div>
                </Show>
                <Show when=move || debug_mode>
                    <div class="debug-line">
                        "debug: " {move || files.with(Vec::len)} " files | "
                        {move || if is_deleting.get() { "deleting..." } else { "idle" }}
                    </div>
                </Show>
                {move || {
                    if is_loading.get() {
                        view! { <div class="placeholder">"loading files..."</div> }.into_view()
                    } else if let Some(error) = load_error.get() {
                        view! { <div class="notice notice-error border-container">{error}</div> }.into_view()
                    } else if filtered_files.with(Vec::is_empty) {
                        view! {
                            <div class="placeholder">
                                <div style="font-size: 32px; margin-bottom: 10px;">"[ ]"</div>
                                <div>"no files to show"</div>
                                <div style="color: #6c7086; font-size: 14px; margin-top: 5px;">
                                    <A href="/upload">"upload a file"</A> " to get started"
                                </div>
                            </div>
                        }.into_view()
                    } else {
                        view! {
                            <div class="files-grid">
                                <For
                                    each=move || filtered_files.get()
                                    key=|record| record.id
                                    let:record
                                >
                                    <FileCard
                                        record=record
                                        on_download=on_download
                                        on_delete=on_delete_request
                                    />
                                </For>
                            </div>
                        }.into_view()
                    }
                }}
            </div>

            <Show when=move || to_delete.get().is_some()>
                <div class="dialog-backdrop">
                    <div class="dialog border-container">
                        <h3 style="margin-top: 0;">"delete file"</h3>
                        <Show when=move || delete_error.get().is_some()>
                            <div class="notice notice-error border-container">
                                {move || delete_error.get().unwrap_or_default()}
                            </div>
                        </Show>
                        <p>
                            "Are you sure you want to delete \""
                            {move || to_delete.get().map(|r| r.filename).unwrap_or_default()}
                            "\"? This action cannot be undone."
                        </p>
                        <div class="dialog-actions">
                            <button
                                type="button"
                                class="action-btn border-container"
                                on:click=move |_| set_to_delete.set(None)
                            >
                                "cancel"
                            </button>
                            <button
                                type="button"
                                class="action-btn delete-btn border-container"
                                disabled=move || is_deleting.get()
                                on:click=on_delete_confirm.clone()
                            >
                                {move || if is_deleting.get() { "deleting..." } else { "delete" }}
                            </button>
                        </div>
                    </div>
                </div>
            </Show>
        </div>
    }
}

#[component]
fn FileCard(
    record: FileRecord,
    on_download: Callback<String>,
    on_delete: Callback<FileRecord>,
) -> impl IntoView {
    let kind = record.kind();
    let preview_href = preview_route(&record.filename);
    let download_name = record.filename.clone();
    let delete_record = record.clone();
    let file_type = record.file_type.clone();

    view! {
        <div class="file-item">
            <div style="display: flex; justify-content: space-between; align-items: start; margin-bottom: 15px;">
                <div style="color: #cdd6f4; font-weight: 500; word-break: break-word; flex: 1; margin-right: 10px;">
                    {record.filename.clone()}
                </div>
                <span
                    class="file-type-badge"
                    style=format!("color: {0}; border-color: {0};", kind_color(kind))
                >
                    {kind.label()}
                </span>
            </div>

            <div class="file-meta">
                <div>"size: " {format_size(record.size)}</div>
                <div>"uploaded: " {format_upload_time(record.upload_time)}</div>
                <Show when=move || kind == PreviewKind::Other>
                    <div style="color: #6c7086;">{file_type.clone()}</div>
                </Show>
            </div>

            <div style="display: flex; gap: 10px; flex-wrap: wrap; margin-top: auto;">
                <A href=preview_href class="action-btn border-container">"preview"</A>
                <button
                    type="button"
                    class="action-btn border-container"
                    on:click=move |_| on_download.call(download_name.clone())
                >
                    "download"
                </button>
                <button
                    type="button"
                    class="action-btn delete-btn border-container"
                    on:click=move |_| on_delete.call(delete_record.clone())
                >
                    "delete"
                </button>
            </div>
        </div>
    }
}

#[component]
fn UploadPage() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let debug_mode = ctx.debug_mode;
    let controller = Rc::new(UploadController::new(ctx.api));

    let (is_uploading, set_is_uploading) = create_signal(false);
    let (is_dragging, set_is_dragging) = create_signal(false);
    let (error, set_error) = create_signal(None::<String>);
    let (success, set_success) = create_signal(None::<String>);
    let (duplicate, set_duplicate) = create_signal(None::<FileRecord>);
    let file_input_ref = create_node_ref::<leptos::html::Input>();

    let clear_input = move || {
        if let Some(input) = file_input_ref.get_untracked() {
            input.set_value("");
        }
    };

    let announce = move |record: FileRecord| {
        let message = if record.filename == record.original_filename {
            format!("File \"{}\" uploaded successfully!", record.filename)
        } else {
            format!(
                "File \"{}\" uploaded successfully as \"{}\"!",
                record.original_filename, record.filename
            )
        };
        set_success.set(Some(message.clone()));
        spawn_local(async move {
            TimeoutFuture::new(NOTICE_MS).await;
            if success.get_untracked().as_deref() == Some(message.as_str()) {
                set_success.set(None);
            }
        });
    };

    let start_upload = {
        let controller = controller.clone();
        move |file: File| {
            if is_uploading.get_untracked() || controller.is_busy() {
                return;
            }
            set_error.set(None);
            set_success.set(None);

            let name = file.name();
            if let Err(err) = validate_name(&name) {
                set_error.set(Some(FileError::from(err).user_message()));
                clear_input();
                return;
            }

            let controller = controller.clone();
            set_is_uploading.set(true);
            spawn_local(async move {
                let result = match read_as_bytes(&file).await {
                    Ok(bytes) => controller.submit(UploadSelection::new(name, bytes)).await,
                    Err(e) => Err(FileError::read(name.as_str(), e)),
                };
                match result {
                    Ok(UploadOutcome::Uploaded(record)) => {
                        clear_input();
                        announce(record);
                    }
                    Ok(UploadOutcome::NeedsConfirmation { existing }) => {
                        set_duplicate.set(Some(existing));
                    }
                    Err(err) => {
                        clear_input();
                        set_error.set(Some(err.user_message()));
                    }
                }
                set_is_uploading.set(false);
            });
        }
    };

    let on_file_change = {
        let start_upload = start_upload.clone();
        move |_ev: web_sys::Event| {
            let Some(input) = file_input_ref.get_untracked() else {
                return;
            };
            if let Some(file) = input
                .files()
                .and_then(|files| FileList::from(files).iter().next().cloned())
            {
                start_upload(file);
            }
        }
    };

    let on_drop = move |ev: DragEvent| {
        ev.prevent_default();
        set_is_dragging.set(false);
        if let Some(file) = ev
            .data_transfer()
            .and_then(|transfer| transfer.files())
            .and_then(|files| FileList::from(files).iter().next().cloned())
        {
            start_upload(file);
        }
    };

    let on_confirm = {
        let controller = controller.clone();
        move |_: web_sys::MouseEvent| {
            let controller = controller.clone();
            set_duplicate.set(None);
            set_is_uploading.set(true);
            spawn_local(async move {
                match controller.confirm().await {
                    Ok(record) => announce(record),
                    Err(err) => set_error.set(Some(err.user_message())),
                }
                clear_input();
                set_is_uploading.set(false);
            });
        }
    };

    let on_cancel = {
        let controller = controller.clone();
        move |_: web_sys::MouseEvent| {
            controller.cancel();
            set_duplicate.set(None);
            clear_input();
        }
    };

    view! {
        <div class="main-grid">
            <div class="upload-section border-container">
                <input
                    type="file"
                    ref=file_input_ref
                    accept=".txt,.pdf,.jpg,.jpeg,.png,.json"
                    disabled=move || is_uploading.get()
                    on:change=on_file_change
                    style="display: none;"
                />
                <div
                    class="dropzone"
                    class:dragging=move || is_dragging.get()
                    class:disabled=move || is_uploading.get()
                    on:click=move |_| {
                        if is_uploading.get_untracked() {
                            return;
                        }
                        if let Some(input) = file_input_ref.get_untracked() {
                            input.click();
                        }
                    }
                    on:dragover=move |ev: DragEvent| {
                        ev.prevent_default();
                        set_is_dragging.set(true);
                    }
                    on:dragleave=move |_| set_is_dragging.set(false)
                    on:drop=on_drop
                >
                    <div style="font-size: 18px; margin-bottom: 10px;">
                        {move || {
                            if is_uploading.get() {
                                "uploading..."
                            } else if is_dragging.get() {
                                "drop the file here"
                            } else {
                                "drag and drop a file here, or click to select"
                            }
                        }}
                    </div>
                    <div style="color: #6c7086; font-size: 13px;">
                        "supported file types: " {SUPPORTED_EXTENSIONS.join(", ")}
                    </div>
                </div>

                <Show when=move || debug_mode>
                    <div class="debug-line">
                        "debug: "
                        {move || if is_uploading.get() { "uploading" } else { "ready" }}
                        {move || duplicate.get().map(|d| format!(" | duplicate of {}", d.filename))}
                    </div>
                </Show>

                <Show when=move || error.get().is_some()>
                    <div class="notice notice-error border-container">
                        {move || error.get().unwrap_or_default()}
                    </div>
                </Show>
                <Show when=move || success.get().is_some()>
                    <div class="notice notice-success border-container">
                        {move || success.get().unwrap_or_default()}
                    </div>
                </Show>
            </div>

            <Show when=move || duplicate.get().is_some()>
                <div class="dialog-backdrop">
                    <div class="dialog border-container">
                        <h3 style="margin-top: 0;">"duplicate file"</h3>
                        <p>
                            "A file with the same name already exists. Do you want to upload it anyway? "
                            "The file will be renamed with a number appended to it."
                        </p>
                        <div class="dialog-actions">
                            <button
                                type="button"
                                class="action-btn border-container"
                                on:click=on_cancel.clone()
                            >
                                "cancel"
                            </button>
                            <button
                                type="button"
                                class="action-btn border-container"
                                on:click=on_confirm.clone()
                            >
                                "upload anyway"
                            </button>
                        </div>
                    </div>
                </div>
            </Show>
        </div>
    }
}

#[component]
fn PreviewPage() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let debug_mode = ctx.debug_mode;
    let resolver = Rc::new(PreviewResolver::new(ctx.api.clone()));
    let params = use_params_map();
    let filename = move || {
        params.with(|params| {
            // already percent-decoded by the router
            params.get("filename").cloned().unwrap_or_default()
        })
    };

    let preview = create_local_resource(filename, move |name: String| {
        let resolver = resolver.clone();
        async move { resolver.resolve(&name).await }
    });

    let (download_error, set_download_error) = create_signal(None::<String>);
    let download = {
        let api = ctx.api;
        move |_: web_sys::MouseEvent| {
            let api = api.clone();
            let name = filename();
            spawn_local(async move {
                let result = match api.download(&name).await {
                    Ok(content) => save_as(&content.bytes, &content.content_type, &name),
                    Err(err) => Err(err.user_message()),
                };
                set_download_error.set(result.err());
            });
        }
    };

    view! {
        <Title text=move || format!("{} - filedeck", filename()) />
        <div class="main-grid">
            <div class="preview-section border-container">
                <div style="display: flex; justify-content: space-between; align-items: center; margin-bottom: 15px;">
                    <A href="/" class="action-btn border-container">"back to files"</A>
                    <h2 style="margin: 0; font-weight: 500; word-break: break-word;">{filename}</h2>
                    <Show when=move || debug_mode>
                        <span class="debug-line">
                            {move || {
                                preview
                                    .get()
                                    .map(|result| match result {
                                        Ok(preview) => preview.content_type().to_string(),
                                        Err(err) => err.to_string(),
                                    })
                                    .unwrap_or_default()
                            }}
                        </span>
                    </Show>
                </div>
                <Suspense fallback=|| view! { <div class="placeholder">"loading preview..."</div> }>
                    {
                        let download = download.clone();
                        move || {
                            let download = download.clone();
                            preview.get().map(move |result| match result {
                                Ok(preview) => view! { <PreviewBody preview=preview name=filename() /> }.into_view(),
                                Err(err @ FileError::UnsupportedPreview(_)) => view! {
                                    <div class="notice border-container">
                                        <p>{err.user_message()}</p>
                                        <button
                                            type="button"
                                            class="action-btn border-container"
                                            on:click=download
                                        >
                                            "download"
                                        </button>
                                    </div>
                                }.into_view(),
                                Err(err) => view! {
                                    <div class="notice notice-error border-container">
                                        {err.user_message()}
                                    </div>
                                }.into_view(),
                            })
                        }
                    }
                </Suspense>
                <Show when=move || download_error.get().is_some()>
                    <div class="notice notice-error border-container">
                        {move || download_error.get().unwrap_or_default()}
                    </div>
                </Show>
            </div>
        </div>
    }
}

#[component]
fn PreviewBody(preview: Preview, name: String) -> impl IntoView {
    match preview {
        Preview::Image { .. } => {
            let src = preview.data_uri().unwrap_or_default();
            view! {
                <div class="file-preview">
                    <img src=src alt=name style="max-width: 100%; max-height: 80vh; object-fit: contain;" />
                </div>
            }
            .into_view()
        }
        Preview::Text { text, .. } => view! {
            <pre class="text-preview">{text}</pre>
        }
        .into_view(),
        Preview::Pdf {
            bytes,
            content_type,
        } => {
            let url = object_url(&bytes, &content_type);
            let src = url.to_string();
            on_cleanup(move || drop(url));
            view! {
                <div style="height: 80vh;">
                    <iframe src=src title=name style="width: 100%; height: 100%; border: none;"></iframe>
                </div>
            }
            .into_view()
        }
    }
}

fn kind_color(kind: PreviewKind) -> &'static str {
    match kind {
        PreviewKind::Image => "#a6e3a1",
        PreviewKind::Text => "#89b4fa",
        PreviewKind::Pdf => "#fab387",
        PreviewKind::Other => "#6c7086",
    }
}

fn format_upload_time(epoch_ms: i64) -> String {
    js_sys::Date::new(&JsValue::from_f64(epoch_ms as f64))
        .to_locale_string("default", &JsValue::UNDEFINED)
        .into()
}

#[wasm_bindgen]
pub fn run() {
    console_error_panic_hook::set_once();
    logger::init();

    spawn_local(async {
        let config = load_host_config().await;
        logger::set_debug(config.debug_mode);
        log::info!("using file API at {}", config.api_base);
        mount_to_body(move || view! { <App config=config /> });
    });
}

const MAIN_STYLES: &str = r#"
@import url("https://fonts.googleapis.com/css2?family=DM+Mono:wght@300;400;500&display=swap");

body {
    font-family: "DM Mono", monospace;
    letter-spacing: -0.05ch;
    background-color: #1e1e2e;
    color: #cdd6f4;
    margin: 0;
    padding: 20px;
}

a { color: #89b4fa; }

.app {
    max-width: 1200px;
    margin: 0 auto;
}

.main-grid {
    display: grid;
    grid-template-columns: 1fr;
    gap: 20px;
    margin: 20px 0;
}

.border-container {
    position: relative;
    padding: 20px;
    border: 2px solid #45475a;
    transition: border-color 0.2s ease-out;
    background-color: #1e1e2e;
}

.border-container::before {
    position: absolute;
    top: -12px;
    left: 20px;
    background-color: #1e1e2e;
    padding: 0 8px;
    font-size: 14px;
    color: #45475a;
    transition: color 0.2s ease-out;
}

.header-section::before { content: "file manager"; }
.header-section:hover { border-color: #cba6f7; }
.search-section::before { content: "search"; }
.search-section:hover { border-color: #fab387; }
.files-section::before { content: "files"; }
.files-section:hover { border-color: #f38ba8; }
.upload-section::before { content: "upload"; }
.upload-section:hover { border-color: #a6e3a1; }
.preview-section::before { content: "preview"; }
.preview-section:hover { border-color: #89b4fa; }

.nav-btn, .action-btn {
    background-color: #1e1e2e;
    border: 2px solid #45475a;
    color: #cdd6f4;
    padding: 12px 16px;
    cursor: pointer;
    font-family: "DM Mono", monospace;
    font-size: 14px;
    text-decoration: none;
    display: inline-block;
}

.nav-btn:hover, .action-btn:hover { border-color: #89b4fa; }
.nav-btn[aria-current="page"] { border-color: #cba6f7; }
.delete-btn:hover { border-color: #f38ba8; }
.action-btn:disabled { color: #6c7086; border-color: #313244; cursor: not-allowed; }

.search-input {
    width: 100%;
    box-sizing: border-box;
    color: #cdd6f4;
    font-family: "DM Mono", monospace;
    font-size: 16px;
    padding: 12px 15px;
}

.search-input:focus { outline: none; border-color: #fab387; }
.search-input::placeholder { color: #6c7086; }

.files-grid {
    display: grid;
    grid-template-columns: repeat(auto-fill, minmax(320px, 1fr));
    gap: 20px;
    margin-top: 20px;
}

.file-item {
    border: 2px solid #45475a;
    padding: 20px;
    display: flex;
    flex-direction: column;
    min-height: 180px;
    transition: border-color 0.2s ease-out;
}

.file-item:hover { border-color: #f38ba8; }

.file-meta {
    color: #a6adc8;
    font-size: 14px;
    margin-bottom: 20px;
    line-height: 1.6;
}

.file-type-badge {
    font-size: 12px;
    padding: 2px 6px;
    border: 1px solid;
    text-transform: uppercase;
}

.dropzone {
    border: 2px dashed #45475a;
    padding: 40px 20px;
    text-align: center;
    cursor: pointer;
    transition: border-color 0.2s ease-out, background-color 0.2s ease-out;
}

.dropzone:hover, .dropzone.dragging { border-color: #a6e3a1; background-color: #313244; }
.dropzone.disabled { cursor: progress; color: #6c7086; }

.notice { margin: 15px 0; padding: 14px 16px; font-size: 14px; }
.notice-error { border-color: #f38ba8; color: #f38ba8; }
.notice-success { border-color: #a6e3a1; color: #a6e3a1; }

.placeholder { text-align: center; padding: 40px 20px; color: #bac2de; }
.debug-line { margin: 10px 0; color: #6c7086; font-size: 12px; }

.dialog-backdrop {
    position: fixed;
    inset: 0;
    background-color: rgba(17, 17, 27, 0.8);
    display: flex;
    align-items: center;
    justify-content: center;
    z-index: 10;
}

.dialog { max-width: 480px; width: 90%; }
.dialog::before { content: "confirm"; }
.dialog-actions { display: flex; justify-content: flex-end; gap: 10px; }

.file-preview {
    display: flex;
    justify-content: center;
    align-items: center;
    border: 1px solid #45475a;
    min-height: 180px;
}

.text-preview {
    white-space: pre-wrap;
    word-wrap: break-word;
    max-height: 80vh;
    overflow: auto;
    margin: 0;
    padding: 1rem;
    background-color: #181825;
    border: 1px solid #45475a;
}

@media (max-width: 768px) {
    .files-grid { grid-template-columns: 1fr; }
}
"#;

#[component]
fn StyleProvider() -> impl IntoView {
    view! {
        <style>{MAIN_STYLES}</style>
    }
}
