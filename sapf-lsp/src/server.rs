//! Main language server implementation

use std::collections::HashMap;
use std::ops::Range as ByteRange;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::features::commands::{
    parse_command, CommandError, EvaluateArgs, SapfCommand, COMMANDS,
};
use crate::features::completion::{completion_items, CompletionCandidate};
use crate::features::evaluation::{evaluation_span, EvaluationMode, EvaluationSettings};
use crate::features::formatting::{
    format_document as compute_format_document, format_range as compute_format_range, LineRange,
    TextEditSpan,
};
use crate::features::hover::{hover as compute_hover, HoverResult};
use crate::generation::CatalogGenerator;
use crate::repl::ProcessLauncher;
use crate::session::Session;
use sapf_config::{Loader, SapfConfig, PROJECT_FILE};
use sapf_parser::sapf::catalog::file as catalog_file;
use sapf_parser::sapf::{FormatOptions, KeywordIndex, SourceLocation, TextSpan};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower_lsp::async_trait;
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionOptions, CompletionParams, CompletionResponse,
    CompletionTextEdit, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DocumentFormattingParams, DocumentRangeFormattingParams,
    Documentation, ExecuteCommandOptions, ExecuteCommandParams, Hover, HoverContents,
    HoverParams, HoverProviderCapability, InitializeParams, InitializeResult, InitializedParams,
    MarkupContent, MarkupKind, MessageType, OneOf, Position, Range, ServerCapabilities,
    ServerInfo, TextDocumentItem, TextDocumentSyncCapability, TextDocumentSyncKind, TextEdit,
    Url, WorkDoneProgressOptions,
};
use tower_lsp::Client;

/// The parts of the tower-lsp client the server uses
#[async_trait]
pub trait LspClient: Send + Sync + Clone + 'static {
    /// Pop-up notification
    async fn show(&self, typ: MessageType, message: String);
    /// Output-channel log line
    async fn log(&self, typ: MessageType, message: String);
}

#[async_trait]
impl LspClient for Client {
    async fn show(&self, typ: MessageType, message: String) {
        self.show_message(typ, message).await;
    }

    async fn log(&self, typ: MessageType, message: String) {
        self.log_message(typ, message).await;
    }
}

pub trait FeatureProvider: Send + Sync + 'static {
    fn completion(
        &self,
        index: &KeywordIndex,
        text: &str,
        offset: usize,
    ) -> Vec<CompletionCandidate>;
    fn hover(&self, index: &KeywordIndex, text: &str, offset: usize) -> Option<HoverResult>;
    fn format_document(&self, text: &str, options: &FormatOptions) -> Vec<TextEditSpan>;
    fn format_range(
        &self,
        text: &str,
        options: &FormatOptions,
        range: LineRange,
    ) -> Vec<TextEditSpan>;
    fn evaluation_span(
        &self,
        text: &str,
        cursor: usize,
        selection: Option<ByteRange<usize>>,
        mode: EvaluationMode,
        settings: EvaluationSettings,
    ) -> TextSpan;
}

#[derive(Default)]
pub struct DefaultFeatureProvider;

impl DefaultFeatureProvider {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureProvider for DefaultFeatureProvider {
    fn completion(
        &self,
        index: &KeywordIndex,
        text: &str,
        offset: usize,
    ) -> Vec<CompletionCandidate> {
        completion_items(index, text, offset)
    }

    fn hover(&self, index: &KeywordIndex, text: &str, offset: usize) -> Option<HoverResult> {
        compute_hover(index, text, offset)
    }

    fn format_document(&self, text: &str, options: &FormatOptions) -> Vec<TextEditSpan> {
        compute_format_document(text, options)
    }

    fn format_range(
        &self,
        text: &str,
        options: &FormatOptions,
        range: LineRange,
    ) -> Vec<TextEditSpan> {
        compute_format_range(text, options, range)
    }

    fn evaluation_span(
        &self,
        text: &str,
        cursor: usize,
        selection: Option<ByteRange<usize>>,
        mode: EvaluationMode,
        settings: EvaluationSettings,
    ) -> TextSpan {
        evaluation_span(text, cursor, selection, mode, settings)
    }
}

#[derive(Default)]
struct DocumentStore {
    entries: RwLock<HashMap<Url, Arc<String>>>,
}

impl DocumentStore {
    async fn upsert(&self, uri: Url, text: String) {
        self.entries.write().await.insert(uri, Arc::new(text));
    }

    async fn get(&self, uri: &Url) -> Option<Arc<String>> {
        self.entries.read().await.get(uri).cloned()
    }

    async fn remove(&self, uri: &Url) {
        self.entries.write().await.remove(uri);
    }
}

/// Configuration in effect, plus what resolving it produced
#[derive(Debug, Clone)]
struct Settings {
    config: SapfConfig,
    root: Option<PathBuf>,
    evaluation: EvaluationSettings,
    warnings: Vec<String>,
}

impl Settings {
    fn new(config: SapfConfig, root: Option<PathBuf>) -> Self {
        let (pair, bracket_warning) = config.evaluation.resolve_brackets();
        let (policy, policy_warning) = config.evaluation.resolve_policy();
        let warnings = bracket_warning.into_iter().chain(policy_warning).collect();
        Self {
            config,
            root,
            evaluation: EvaluationSettings {
                pair: Some(pair),
                policy,
            },
            warnings,
        }
    }

    fn catalog_path(&self) -> Option<PathBuf> {
        self.config.catalog.resolve_path(self.root.as_deref())
    }
}

pub struct SapfLanguageServer<C = Client, P = DefaultFeatureProvider> {
    client: C,
    documents: DocumentStore,
    features: Arc<P>,
    session: Session,
    settings: RwLock<Settings>,
}

impl SapfLanguageServer<Client, DefaultFeatureProvider> {
    pub fn new(client: Client, config: SapfConfig) -> Self {
        Self::with_features(
            client,
            Arc::new(DefaultFeatureProvider::new()),
            Session::new(Arc::new(ProcessLauncher)),
            config,
        )
    }
}

impl<C, P> SapfLanguageServer<C, P>
where
    C: LspClient,
    P: FeatureProvider,
{
    pub fn with_features(client: C, features: Arc<P>, session: Session, config: SapfConfig) -> Self {
        Self {
            client,
            documents: DocumentStore::default(),
            features,
            session,
            settings: RwLock::new(Settings::new(config, None)),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn document_text(&self, uri: &Url) -> Option<Arc<String>> {
        self.documents.get(uri).await
    }

    async fn format_options(&self) -> FormatOptions {
        self.settings.read().await.config.formatting.format_options()
    }

    /// Re-read configuration for a workspace root.
    async fn configure(&self, root: PathBuf) {
        let mut settings = self.settings.write().await;
        match Loader::new().with_project(&root).build() {
            Ok(config) => *settings = Settings::new(config, Some(root)),
            Err(err) => {
                settings.root = Some(root);
                settings
                    .warnings
                    .push(format!("ignoring {PROJECT_FILE}: {err}"));
            }
        }
    }

    async fn run_command(&self, command: SapfCommand) -> std::result::Result<Value, String> {
        match command {
            SapfCommand::StartRepl => {
                let repl = self.settings.read().await.config.repl.clone();
                let started = self
                    .session
                    .start_repl(&repl)
                    .await
                    .map_err(|err| err.to_string())?;
                Ok(Value::Bool(started))
            }
            SapfCommand::EvaluateBlock(args) => self.evaluate(args, EvaluationMode::Block).await,
            SapfCommand::EvaluateLine(args) => self.evaluate(args, EvaluationMode::Line).await,
            SapfCommand::StopSound => {
                let stop = self.settings.read().await.config.evaluation.stop_command.clone();
                let sent = self
                    .session
                    .send_if_running(&stop)
                    .await
                    .map_err(|err| err.to_string())?;
                Ok(Value::Bool(sent))
            }
            SapfCommand::StopRepl => Ok(Value::Bool(self.session.stop_repl().await)),
            SapfCommand::RegenerateCatalog => self.regenerate_catalog().await,
            SapfCommand::LoadCatalog(path) => {
                let path = match path {
                    Some(path) => path,
                    None => self
                        .settings
                        .read()
                        .await
                        .catalog_path()
                        .ok_or("no catalog file given and catalog.path is not set")?,
                };
                self.load_catalog(&path).await
            }
            SapfCommand::RemoveCatalog => {
                self.session.catalog().clear().await;
                self.client
                    .log(MessageType::INFO, "sapf catalog removed".to_string())
                    .await;
                Ok(Value::Bool(true))
            }
        }
    }

    async fn evaluate(
        &self,
        args: EvaluateArgs,
        mode: EvaluationMode,
    ) -> std::result::Result<Value, String> {
        let text = self
            .document_text(&args.uri)
            .await
            .ok_or_else(|| format!("{} is not open", args.uri))?;
        let locator = SourceLocation::new(&text);
        let cursor = to_offset(&text, &locator, args.position);
        let selection = args
            .selection
            .map(|range| to_offset(&text, &locator, range.start)..to_offset(&text, &locator, range.end));

        let (repl, evaluation) = {
            let settings = self.settings.read().await;
            (settings.config.repl.clone(), settings.evaluation)
        };
        let span = self
            .features
            .evaluation_span(&text, cursor, selection, mode, evaluation);

        if !span.text.trim().is_empty() {
            self.session
                .send(&repl, &span.text)
                .await
                .map_err(|err| err.to_string())?;
        }
        Ok(json!({
            "text": span.text,
            "range": to_lsp_range(&text, &locator, span.range()),
        }))
    }

    async fn regenerate_catalog(&self) -> std::result::Result<Value, String> {
        let (repl, path) = {
            let settings = self.settings.read().await;
            (settings.config.repl.clone(), settings.catalog_path())
        };
        let catalog = CatalogGenerator::new(&repl)
            .generate()
            .await
            .map_err(|err| format!("catalog generation failed: {err}"))?;

        let functions = catalog.len();
        self.session
            .catalog()
            .replace(KeywordIndex::from_catalog(&catalog))
            .await;
        self.client
            .log(
                MessageType::INFO,
                format!("generated sapf catalog with {functions} functions"),
            )
            .await;

        if let Some(path) = &path {
            if let Err(err) = catalog_file::write(path, &catalog) {
                self.client.show(MessageType::WARNING, err.to_string()).await;
            }
        }
        Ok(json!({ "functions": functions, "path": path }))
    }

    async fn load_catalog(&self, path: &Path) -> std::result::Result<Value, String> {
        let index = KeywordIndex::load(path).map_err(|err| err.to_string())?;
        let functions = index.len();
        self.session.catalog().replace(index).await;
        self.client
            .log(
                MessageType::INFO,
                format!("loaded {functions} sapf functions from {}", path.display()),
            )
            .await;
        Ok(json!({ "functions": functions, "path": path }))
    }
}

fn to_offset(text: &str, locator: &SourceLocation, position: Position) -> usize {
    locator.utf16_to_offset(text, position.line as usize, position.character as usize)
}

fn to_lsp_position(text: &str, locator: &SourceLocation, offset: usize) -> Position {
    let (line, character) = locator.offset_to_utf16(text, offset);
    Position::new(line as u32, character as u32)
}

fn to_lsp_range(text: &str, locator: &SourceLocation, range: ByteRange<usize>) -> Range {
    Range {
        start: to_lsp_position(text, locator, range.start),
        end: to_lsp_position(text, locator, range.end),
    }
}

fn to_text_edit(text: &str, locator: &SourceLocation, edit: TextEditSpan) -> TextEdit {
    TextEdit {
        range: to_lsp_range(text, locator, edit.start..edit.end),
        new_text: edit.new_text,
    }
}

fn to_completion_item(
    text: &str,
    locator: &SourceLocation,
    candidate: CompletionCandidate,
) -> CompletionItem {
    CompletionItem {
        label: candidate.label.clone(),
        kind: Some(CompletionItemKind::FUNCTION),
        detail: candidate.detail,
        documentation: Some(Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: candidate.documentation,
        })),
        text_edit: Some(CompletionTextEdit::Edit(TextEdit {
            range: to_lsp_range(text, locator, candidate.replace),
            new_text: candidate.label,
        })),
        ..CompletionItem::default()
    }
}

/// Lines touched by an LSP range, end exclusive. A range ending at column 0 does not
/// include that line.
fn line_range(range: Range) -> LineRange {
    let start = range.start.line as usize;
    let mut end = range.end.line as usize;
    if range.end.character > 0 || end <= start {
        end += 1;
    }
    LineRange { start, end }
}

#[allow(deprecated)]
fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| &folder.uri)
        .or(params.root_uri.as_ref())
        .and_then(|uri| uri.to_file_path().ok())
}

fn command_error(err: CommandError) -> Error {
    match err {
        CommandError::Unknown(_) => Error::invalid_request(),
        other => Error::invalid_params(other.to_string()),
    }
}

#[async_trait]
impl<C, P> tower_lsp::LanguageServer for SapfLanguageServer<C, P>
where
    C: LspClient,
    P: FeatureProvider,
{
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(root) = workspace_root(&params) {
            self.configure(root).await;
        }

        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            completion_provider: Some(CompletionOptions::default()),
            document_formatting_provider: Some(OneOf::Left(true)),
            document_range_formatting_provider: Some(OneOf::Left(true)),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: COMMANDS.iter().map(|command| command.to_string()).collect(),
                work_done_progress_options: WorkDoneProgressOptions::default(),
            }),
            ..ServerCapabilities::default()
        };

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "sapf-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let (warnings, catalog_path) = {
            let mut settings = self.settings.write().await;
            (std::mem::take(&mut settings.warnings), settings.catalog_path())
        };
        for warning in warnings {
            log::warn!("{warning}");
            self.client.show(MessageType::WARNING, warning).await;
        }

        if let Some(path) = catalog_path.filter(|path| path.exists()) {
            if let Err(message) = self.load_catalog(&path).await {
                self.client.show(MessageType::WARNING, message).await;
            }
        }
    }

    async fn shutdown(&self) -> Result<()> {
        self.session.shutdown().await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let TextDocumentItem { uri, text, .. } = params.text_document;
        self.documents.upsert(uri, text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents
                .upsert(params.text_document.uri, change.text)
                .await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let position = params.text_document_position;
        let Some(text) = self.document_text(&position.text_document.uri).await else {
            return Ok(None);
        };
        let locator = SourceLocation::new(&text);
        let offset = to_offset(&text, &locator, position.position);
        let index = self.session.catalog().current().await;

        let items: Vec<CompletionItem> = self
            .features
            .completion(&index, &text, offset)
            .into_iter()
            .map(|candidate| to_completion_item(&text, &locator, candidate))
            .collect();
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        if let Some(text) = self.document_text(&position.text_document.uri).await {
            let locator = SourceLocation::new(&text);
            let offset = to_offset(&text, &locator, position.position);
            let index = self.session.catalog().current().await;
            if let Some(result) = self.features.hover(&index, &text, offset) {
                return Ok(Some(Hover {
                    contents: HoverContents::Markup(MarkupContent {
                        kind: MarkupKind::Markdown,
                        value: result.contents,
                    }),
                    range: Some(to_lsp_range(&text, &locator, result.range)),
                }));
            }
        }
        Ok(None)
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let Some(text) = self.document_text(&params.text_document.uri).await else {
            return Ok(None);
        };
        let options = self.format_options().await;
        let locator = SourceLocation::new(&text);
        let edits = self
            .features
            .format_document(&text, &options)
            .into_iter()
            .map(|edit| to_text_edit(&text, &locator, edit))
            .collect();
        Ok(Some(edits))
    }

    async fn range_formatting(
        &self,
        params: DocumentRangeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        let Some(text) = self.document_text(&params.text_document.uri).await else {
            return Ok(None);
        };
        let options = self.format_options().await;
        let locator = SourceLocation::new(&text);
        let edits = self
            .features
            .format_range(&text, &options, line_range(params.range))
            .into_iter()
            .map(|edit| to_text_edit(&text, &locator, edit))
            .collect();
        Ok(Some(edits))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let command = parse_command(&params.command, &params.arguments).map_err(command_error)?;
        match self.run_command(command).await {
            Ok(value) => Ok(Some(value)),
            Err(message) => {
                log::error!("{}: {message}", params.command);
                self.client.show(MessageType::ERROR, message.clone()).await;
                Err(Error {
                    code: ErrorCode::InternalError,
                    message: message.into(),
                    data: None,
                })
            }
        }
    }
}
