use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, FormData, Headers, Request, RequestInit, RequestMode, Response, Url};

use crate::models::{
    Blueprint, BlueprintRow, ChatMessage, ChatSession, DraftResponse, ExecuteResponse,
    IntentReply, WorkflowListResponse,
};

/// REST client for the co-pilot backend plus the managed-table reads.
///
/// Every method returns `Result<_, JsValue>`; callers surface failures as
/// toasts and clear their in-flight flag on both paths.
pub struct ApiClient {
    api_base: String,
    data_base: String,
}

impl ApiClient {
    pub fn new() -> Self {
        Self {
            api_base: super::get_api_base_url(),
            data_base: super::get_data_base_url(),
        }
    }

    // ---------------- Workflow lifecycle ----------------

    /// Ask the backend to draft a workflow from a natural-language prompt.
    /// The endpoint takes query parameters and an empty body.
    pub async fn generate_draft(&self, prompt: &str, user_id: &str) -> Result<DraftResponse, JsValue> {
        let url = format!(
            "{}/workflow/draft?prompt={}&user_id={}",
            self.api_base,
            encode(prompt),
            encode(user_id)
        );
        let text = Self::fetch_json(&url, "POST", None).await?;
        parse(&text)
    }

    /// Read the drafted blueprint from the managed `workflow_blueprints`
    /// table (row read by id, PostgREST style).
    pub async fn fetch_blueprint(&self, workflow_id: &str) -> Result<BlueprintRow, JsValue> {
        let url = format!(
            "{}/workflow_blueprints?id=eq.{}&select=*",
            self.data_base,
            encode(workflow_id)
        );
        let text = Self::fetch_json(&url, "GET", None).await?;
        let mut rows: Vec<BlueprintRow> = parse(&text)?;
        rows.pop()
            .ok_or_else(|| JsValue::from_str("Blueprint not found"))
    }

    pub async fn save_workflow(
        &self,
        user_id: &str,
        name: &str,
        blueprint: &Blueprint,
    ) -> Result<(), JsValue> {
        let url = format!(
            "{}/workflow/save?user_id={}&workflow_name={}",
            self.api_base,
            encode(user_id),
            encode(name)
        );
        let body = serde_json::json!({ "blueprint": blueprint });
        let body = serde_json::to_string(&body)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))?;
        let _ = Self::fetch_json(&url, "POST", Some(&body)).await?;
        Ok(())
    }

    pub async fn list_workflows(&self, user_id: &str) -> Result<WorkflowListResponse, JsValue> {
        let url = format!("{}/workflows?user_id={}", self.api_base, encode(user_id));
        let text = Self::fetch_json(&url, "GET", None).await?;
        parse(&text)
    }

    pub async fn delete_workflow(&self, workflow_id: &str, user_id: &str) -> Result<(), JsValue> {
        let url = format!(
            "{}/workflows/{}?user_id={}",
            self.api_base,
            encode(workflow_id),
            encode(user_id)
        );
        let _ = Self::fetch_json(&url, "DELETE", None).await?;
        Ok(())
    }

    /// Kick off a run; the returned `run_id` keys the live monitor feed.
    pub async fn execute_workflow(
        &self,
        blueprint: &Blueprint,
        payload: &serde_json::Value,
    ) -> Result<ExecuteResponse, JsValue> {
        let url = format!("{}/workflow/execute", self.api_base);
        let body = serde_json::json!({ "blueprint": blueprint, "payload": payload });
        let body = serde_json::to_string(&body)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))?;
        let text = Self::fetch_json(&url, "POST", Some(&body)).await?;
        parse(&text)
    }

    // ---------------- Chat / intent ----------------

    /// Multipart audio upload to the voice intent parser.
    #[allow(dead_code)]
    pub async fn send_voice_command(&self, form: &FormData) -> Result<IntentReply, JsValue> {
        let url = format!("{}/intent-parser", self.api_base);

        let opts = RequestInit::new();
        opts.set_method("POST");
        opts.set_mode(RequestMode::Cors);
        // No Content-Type header: the browser supplies the multipart
        // boundary itself.
        opts.set_body(form.as_ref());

        let request = Request::new_with_str_and_init(&url, &opts)?;
        let text = Self::run_request(request).await?;
        parse(&text)
    }

    pub async fn confirm_invoice(&self, invoice_id: &str) -> Result<(), JsValue> {
        let url = format!("{}/invoices/{}/confirm", self.api_base, encode(invoice_id));
        let _ = Self::fetch_json(&url, "PATCH", None).await?;
        Ok(())
    }

    pub async fn delete_invoice(&self, invoice_id: &str) -> Result<(), JsValue> {
        let url = format!("{}/invoices/{}", self.api_base, encode(invoice_id));
        let _ = Self::fetch_json(&url, "DELETE", None).await?;
        Ok(())
    }

    #[allow(dead_code)]
    pub async fn confirm_social_post(
        &self,
        session_id: &str,
        platform: &str,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<(), JsValue> {
        let url = format!("{}/chat/confirm-social", self.api_base);
        let body = serde_json::json!({
            "session_id": session_id,
            "platform": platform,
            "content": content,
            "image_url": image_url,
        });
        let body = serde_json::to_string(&body)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))?;
        let _ = Self::fetch_json(&url, "POST", Some(&body)).await?;
        Ok(())
    }

    #[allow(dead_code)]
    pub async fn reject_social_post(&self, session_id: &str) -> Result<(), JsValue> {
        let url = format!("{}/chat/reject-social", self.api_base);
        let body = serde_json::json!({ "session_id": session_id });
        let body = serde_json::to_string(&body)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))?;
        let _ = Self::fetch_json(&url, "POST", Some(&body)).await?;
        Ok(())
    }

    // ---------------- Exports ----------------

    /// Fetch a binary export and hand it to the browser as a download.
    /// `endpoint` is a path under `/export`, e.g. "/export/inventory".
    pub async fn download_export(&self, endpoint: &str, filename: &str) -> Result<(), JsValue> {
        let url = format!("{}{}", self.api_base, endpoint);

        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);
        let request = Request::new_with_str_and_init(&url, &opts)?;

        let window = web_sys::window().expect("no global window exists");
        let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
        let resp: Response = resp_value.dyn_into()?;
        if !resp.ok() {
            return Err(JsValue::from_str(&format!(
                "Export failed: {} {}",
                resp.status(),
                resp.status_text()
            )));
        }

        let blob: Blob = JsFuture::from(resp.blob()?).await?.dyn_into()?;
        let object_url = Url::create_object_url_with_blob(&blob)?;

        let document = window.document().expect("no document exists");
        let anchor: web_sys::HtmlAnchorElement =
            document.create_element("a")?.dyn_into()?;
        anchor.set_href(&object_url);
        anchor.set_download(filename);
        document.body().expect("no body").append_child(&anchor)?;
        anchor.click();
        anchor.remove();
        Url::revoke_object_url(&object_url)?;
        Ok(())
    }

    // ---------------- Omni inbox (managed-table reads) ----------------

    pub async fn fetch_inbox_sessions(&self) -> Result<Vec<ChatSession>, JsValue> {
        let url = format!("{}/chat_sessions?select=*", self.data_base);
        let text = Self::fetch_json(&url, "GET", None).await?;
        parse(&text)
    }

    pub async fn fetch_session_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, JsValue> {
        let url = format!(
            "{}/chat_messages?session_id=eq.{}&select=*&order=created_at.asc",
            self.data_base,
            encode(session_id)
        );
        let text = Self::fetch_json(&url, "GET", None).await?;
        parse(&text)
    }

    // ---------------- Plumbing ----------------

    /// Helper to make fetch requests with a JSON body/response.
    pub async fn fetch_json(url: &str, method: &str, body: Option<&str>) -> Result<String, JsValue> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);

        let headers = Headers::new()?;
        if let Some(data) = body {
            opts.set_body(&JsValue::from_str(data));
            headers.append("Content-Type", "application/json")?;
        }
        opts.set_headers(&headers);

        let request = Request::new_with_str_and_init(url, &opts)?;
        Self::run_request(request).await
    }

    async fn run_request(request: Request) -> Result<String, JsValue> {
        let window = web_sys::window().expect("no global window exists");
        let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
        let resp: Response = resp_value.dyn_into()?;

        if !resp.ok() {
            return Err(JsValue::from_str(&format!(
                "API request failed: {} {}",
                resp.status(),
                resp.status_text()
            )));
        }

        let text = JsFuture::from(resp.text()?).await?;
        Ok(text.as_string().unwrap_or_default())
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(value: &str) -> String {
    js_sys::encode_uri_component(value).into()
}

fn parse<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, JsValue> {
    serde_json::from_str(text)
        .map_err(|e| JsValue::from_str(&format!("Failed to parse response: {}", e)))
}
