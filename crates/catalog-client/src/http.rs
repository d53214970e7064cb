use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tagsync_core_types::{Container, ContainerId, Label, LabelId};
use tracing::debug;
use url::Url;

use crate::api::{CatalogClient, Page};
use crate::errors::CatalogError;

const TARGET_PREFIX: &str = "AWS242ServiceCatalogService";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

#[derive(Clone, Debug)]
pub struct HttpCatalogConfig {
    pub endpoint: Url,
    pub timeout: Duration,
    pub page_size: u32,
}

impl HttpCatalogConfig {
    /// Regional endpoint of the catalog service.
    pub fn for_region(region: &str) -> Result<Self, CatalogError> {
        let endpoint = Url::parse(&format!("https://servicecatalog.{region}.amazonaws.com/"))
            .map_err(|err| CatalogError::InvalidRequest(format!("region {region}: {err}")))?;
        Ok(Self {
            endpoint,
            timeout: Duration::from_secs(10),
            page_size: 20,
        })
    }
}

/// Catalog client speaking the JSON action protocol over HTTP.
///
/// Requests are sent unsigned; the endpoint is expected to be a signing
/// gateway or a local emulator.
#[derive(Clone)]
pub struct HttpCatalogClient {
    config: HttpCatalogConfig,
    client: reqwest::Client,
}

impl HttpCatalogClient {
    pub fn new(config: HttpCatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| CatalogError::Transport(err.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    async fn call<Req, Resp>(&self, action: &str, body: &Req) -> Result<Resp, CatalogError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        debug!(action, endpoint = %self.config.endpoint, "catalog request");
        let response = self
            .client
            .post(self.config.endpoint.clone())
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{action}"))
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .json(body)
            .send()
            .await
            .map_err(|err| CatalogError::Transport(format!("{action}: {err}")))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| CatalogError::Transport(format!("{action}: {err}")))?;
        let payload: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };

        if !status.is_success() {
            let fault: ServiceFault = serde_json::from_slice(payload).unwrap_or_default();
            let kind = fault.kind.unwrap_or_else(|| format!("Http{}", status.as_u16()));
            let message = fault
                .message
                .or(fault.message_upper)
                .unwrap_or_else(|| status.to_string());
            return Err(CatalogError::from_service(&kind, message));
        }

        serde_json::from_slice(payload).map_err(|err| CatalogError::Rejected {
            kind: "MalformedResponse".into(),
            message: format!("{action}: {err}"),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ServiceFault {
    #[serde(rename = "__type")]
    kind: Option<String>,
    message: Option<String>,
    #[serde(rename = "Message")]
    message_upper: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ActiveFilter {
    active: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListTagOptionsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<ActiveFilter>,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TagOptionDetail {
    id: String,
    key: String,
    value: String,
    #[serde(default)]
    active: bool,
}

impl From<TagOptionDetail> for Label {
    fn from(detail: TagOptionDetail) -> Self {
        Label {
            id: LabelId(detail.id),
            key: detail.key,
            value: detail.value,
            active: detail.active,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListTagOptionsResponse {
    #[serde(default)]
    tag_option_details: Vec<TagOptionDetail>,
    page_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListPortfoliosRequest {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct IdDetail {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListPortfoliosResponse {
    #[serde(default)]
    portfolio_details: Vec<IdDetail>,
    next_page_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ListResourcesForTagOptionRequest<'a> {
    tag_option_id: &'a str,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListResourcesForTagOptionResponse {
    #[serde(default)]
    resource_details: Vec<IdDetail>,
    page_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateTagOptionRequest<'a> {
    key: &'a str,
    value: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateTagOptionResponse {
    tag_option_detail: TagOptionDetail,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateTagOptionRequest<'a> {
    id: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteTagOptionRequest<'a> {
    id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TagOptionResourceRequest<'a> {
    resource_id: &'a str,
    tag_option_id: &'a str,
}

#[derive(Deserialize)]
struct Empty {}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn list_labels(
        &self,
        active_only: bool,
        page_token: Option<String>,
    ) -> Result<Page<Label>, CatalogError> {
        let request = ListTagOptionsRequest {
            filters: active_only.then_some(ActiveFilter { active: true }),
            page_size: self.config.page_size,
            page_token,
        };
        let response: ListTagOptionsResponse = self.call("ListTagOptions", &request).await?;
        Ok(Page {
            items: response
                .tag_option_details
                .into_iter()
                .map(Label::from)
                .collect(),
            next: response.page_token,
        })
    }

    async fn list_containers(
        &self,
        page_token: Option<String>,
    ) -> Result<Page<Container>, CatalogError> {
        let request = ListPortfoliosRequest {
            page_size: self.config.page_size,
            page_token,
        };
        let response: ListPortfoliosResponse = self.call("ListPortfolios", &request).await?;
        Ok(Page {
            items: response
                .portfolio_details
                .into_iter()
                .map(|detail| Container {
                    id: ContainerId(detail.id),
                })
                .collect(),
            next: response.next_page_token,
        })
    }

    async fn list_resources_for_label(
        &self,
        label: &LabelId,
        page_token: Option<String>,
    ) -> Result<Page<ContainerId>, CatalogError> {
        let request = ListResourcesForTagOptionRequest {
            tag_option_id: label.as_str(),
            page_size: self.config.page_size,
            page_token,
        };
        let response: ListResourcesForTagOptionResponse =
            self.call("ListResourcesForTagOption", &request).await?;
        Ok(Page {
            items: response
                .resource_details
                .into_iter()
                .map(|detail| ContainerId(detail.id))
                .collect(),
            next: response.page_token,
        })
    }

    async fn create_label(&self, key: &str, value: &str) -> Result<LabelId, CatalogError> {
        let response: CreateTagOptionResponse = self
            .call("CreateTagOption", &CreateTagOptionRequest { key, value })
            .await?;
        Ok(LabelId(response.tag_option_detail.id))
    }

    async fn update_label(&self, label: &LabelId, value: &str) -> Result<(), CatalogError> {
        let request = UpdateTagOptionRequest {
            id: label.as_str(),
            value,
        };
        let _: Empty = self.call("UpdateTagOption", &request).await?;
        Ok(())
    }

    async fn delete_label(&self, label: &LabelId) -> Result<(), CatalogError> {
        let request = DeleteTagOptionRequest { id: label.as_str() };
        let _: Empty = self.call("DeleteTagOption", &request).await?;
        Ok(())
    }

    async fn associate(
        &self,
        label: &LabelId,
        resource: &ContainerId,
    ) -> Result<(), CatalogError> {
        let request = TagOptionResourceRequest {
            resource_id: resource.as_str(),
            tag_option_id: label.as_str(),
        };
        let _: Empty = self
            .call("AssociateTagOptionWithResource", &request)
            .await?;
        Ok(())
    }

    async fn disassociate(
        &self,
        label: &LabelId,
        resource: &ContainerId,
    ) -> Result<(), CatalogError> {
        let request = TagOptionResourceRequest {
            resource_id: resource.as_str(),
            tag_option_id: label.as_str(),
        };
        let _: Empty = self
            .call("DisassociateTagOptionFromResource", &request)
            .await?;
        Ok(())
    }
}
