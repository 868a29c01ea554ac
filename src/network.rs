use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;

use crate::error::{Result, RosterError};
use crate::models::SortMode;

/// One group as listed by the server.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct GroupRecord {
    pub name: String,
    #[serde(default)]
    pub usercount: Option<i64>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupSubsets {
    #[serde(default)]
    pub admin_groups: Vec<GroupRecord>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
}

#[derive(Debug, Deserialize)]
struct GroupsResponse {
    data: GroupSubsets,
}

#[derive(Debug, Deserialize)]
struct GroupName {
    groupname: String,
}

/// Success bodies of the create endpoint. `Canonical` is the current
/// contract; `Legacy` is still accepted from older servers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CreateResponse {
    Canonical { groupname: String },
    Legacy { data: GroupName },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    total_users: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub name: String,
    #[serde(default)]
    pub displayname: Option<String>,
}

/// Parameters of a group read request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupQuery {
    pub pattern: String,
    pub filter_groups: bool,
    pub sort_mode: SortMode,
}

/// Server endpoints the roster talks to.
#[async_trait]
pub trait GroupBackend: Send + Sync {
    async fn fetch_groups(&self, query: &GroupQuery) -> Result<GroupSubsets>;
    /// Returns the id the server assigned to the new group.
    async fn create_group(&self, name: &str) -> Result<String>;
    async fn delete_group(&self, id: &str) -> Result<()>;
    async fn fetch_total_users(&self) -> Result<u64>;
    async fn fetch_members(&self, gid: &str, limit: usize) -> Result<Vec<UserRecord>>;
}

pub struct HttpBackend {
    client: Client,
    base: Url,
    username: String,
    password: String,
}

impl HttpBackend {
    pub fn new(server_url: &str, username: &str, password: &str) -> anyhow::Result<Self> {
        let base = Url::parse(server_url)?;
        if base.cannot_be_a_base() {
            anyhow::bail!("{server_url} is not a usable server URL");
        }
        let client = Client::builder()
            .user_agent(concat!("grouproster/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base,
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RosterError::Validation(format!("{} is not a usable server URL", self.base)))?
            .pop_if_empty()
            .extend(["index.php", "settings", "users"])
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
            .header("OCS-APIREQUEST", "true")
            .header(reqwest::header::ACCEPT, "application/json")
    }
}

/// Maps non-2xx replies to `RosterError::Server`, reading `{message}` when present.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
    Err(RosterError::Server { status: status.as_u16(), message })
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl GroupBackend for HttpBackend {
    async fn fetch_groups(&self, query: &GroupQuery) -> Result<GroupSubsets> {
        let url = self.url(&["groups"])?;
        let sort = u8::from(query.sort_mode == SortMode::ByMemberCount).to_string();
        let filter = u8::from(query.filter_groups).to_string();
        let response = self
            .request(reqwest::Method::GET, url)
            .query(&[
                ("pattern", query.pattern.as_str()),
                ("filterGroups", filter.as_str()),
                ("sortGroups", sort.as_str()),
            ])
            .send()
            .await?;
        let body: GroupsResponse = decode(check(response).await?).await?;
        tracing::debug!(
            admin = body.data.admin_groups.len(),
            regular = body.data.groups.len(),
            "fetched groups"
        );
        Ok(body.data)
    }

    async fn create_group(&self, name: &str) -> Result<String> {
        let url = self.url(&["groups"])?;
        let response = self
            .request(reqwest::Method::POST, url)
            .form(&[("id", name)])
            .send()
            .await?;
        let body: CreateResponse = decode(check(response).await?).await?;
        match body {
            CreateResponse::Canonical { groupname } => Ok(groupname),
            CreateResponse::Legacy { data } => {
                tracing::debug!(group = %data.groupname, "server replied with legacy create shape");
                Ok(data.groupname)
            }
        }
    }

    async fn delete_group(&self, id: &str) -> Result<()> {
        let url = self.url(&["groups", id])?;
        let response = self.request(reqwest::Method::DELETE, url).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn fetch_total_users(&self) -> Result<u64> {
        let url = self.url(&["stats"])?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let stats: StatsResponse = decode(check(response).await?).await?;
        Ok(stats.total_users.max(0) as u64)
    }

    async fn fetch_members(&self, gid: &str, limit: usize) -> Result<Vec<UserRecord>> {
        let url = self.url(&["users"])?;
        let limit = limit.to_string();
        let response = self
            .request(reqwest::Method::GET, url)
            .query(&[("offset", "0"), ("limit", limit.as_str()), ("gid", gid)])
            .send()
            .await?;
        decode(check(response).await?).await
    }
}
