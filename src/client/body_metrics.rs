use super::forms::BodyMetricForm;
use super::{ApiClient, ClientResult, ResourceState};
use crate::models::{BodyMetric, RangeQuery, UpdateBodyMetric};

pub struct BodyMetricStore {
    client: ApiClient,
    pub metrics: ResourceState<Vec<BodyMetric>>,
    pub total: i64,
    pub query: RangeQuery,
}

impl BodyMetricStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            metrics: ResourceState::Idle,
            total: 0,
            query: RangeQuery::default(),
        }
    }

    pub async fn load(&mut self) {
        self.metrics = ResourceState::Loading;
        match self.client.list_body_metrics(&self.query).await {
            Ok(page) => {
                self.total = page.total;
                self.metrics = ResourceState::Loaded(page.items);
            }
            Err(e) => self.metrics = ResourceState::Error(e.to_string()),
        }
    }

    pub async fn set_range(&mut self, query: RangeQuery) {
        self.query = query;
        self.load().await;
    }

    pub async fn create(&mut self, form: &BodyMetricForm) -> ClientResult<BodyMetric> {
        let input = form.to_input()?;
        let metric = self.client.create_body_metric(&input).await?;
        self.load().await;
        Ok(metric)
    }

    pub async fn update(&mut self, id: &str, patch: &UpdateBodyMetric) -> ClientResult<BodyMetric> {
        let metric = self.client.update_body_metric(id, patch).await?;
        self.load().await;
        Ok(metric)
    }

    pub async fn delete(&mut self, id: &str) -> ClientResult<()> {
        self.client.delete_body_metric(id).await?;
        self.load().await;
        Ok(())
    }
}
