//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::cache::{CacheGetParams, get_impl, list_impl};
use crate::tools::worker::{
    SwFetchParams, SwInstallParams, SwMessageParams, SwNotificationClickParams, SwPushParams, SwSyncParams,
    activate_impl, click_impl, fetch_impl, install_impl, message_impl, push_impl, sync_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellcache_client::{CacheManager, RecordedHost};

/// The main MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellCacheServer {
    manager: Arc<CacheManager>,
    host: Arc<RecordedHost>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellCacheServer {
    /// Create a new server handler around a cache manager and the host it reports to.
    pub fn new(manager: Arc<CacheManager>, host: Arc<RecordedHost>) -> Self {
        Self { manager, host, tool_router: Self::tool_router() }
    }

    #[tool(description = "Install the current version: precache the app shell into the static generation.")]
    async fn sw_install(&self, params: Parameters<SwInstallParams>) -> Result<CallToolResult, McpError> {
        install_impl(&self.manager, &self.host, params.0).await
    }

    #[tool(description = "Activate the installed version: delete stale generations and claim open clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.manager, &self.host).await
    }

    /// Send a request through the cache manager.
    ///
    /// Non-GET and never-cache requests go straight to the network; everything else is
    /// served cache-first, network-first or with the navigation fallback.
    #[tool(description = "Fetch a URL through the offline cache. Returns the route taken and the response.")]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.manager, params.0).await
    }

    #[tool(description = "Post a control message (SKIP_WAITING or GET_VERSION) to the cache manager.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.manager, &self.host, params.0).await
    }

    #[tool(description = "Deliver a push message. Shows a notification when the payload has a title.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.manager, &self.host, params.0).await
    }

    #[tool(description = "Click a notification: close it and open its target page.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        click_impl(&self.manager, &self.host, params.0).await
    }

    #[tool(description = "Fire a background sync event for a tag.")]
    async fn sw_sync(&self, params: Parameters<SwSyncParams>) -> Result<CallToolResult, McpError> {
        sync_impl(&self.manager, params.0).await
    }

    #[tool(description = "List cache generations and the entries stored in each.")]
    async fn cache_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.manager).await
    }

    #[tool(description = "Retrieve a stored response by method and URL.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.manager, params.0).await
    }
}

impl ServerHandler for ShellCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
