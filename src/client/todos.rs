use super::forms::TodoForm;
use super::{ApiClient, ClientResult, ResourceState};
use crate::models::{PageParams, Todo};

pub struct TodoStore {
    client: ApiClient,
    pub todos: ResourceState<Vec<Todo>>,
    pub total: i64,
    pub page: PageParams,
}

impl TodoStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            todos: ResourceState::Idle,
            total: 0,
            page: PageParams::default(),
        }
    }

    pub async fn load(&mut self) {
        self.todos = ResourceState::Loading;
        match self.client.list_todos(&self.page).await {
            Ok(page) => {
                self.total = page.total;
                self.todos = ResourceState::Loaded(page.items);
            }
            Err(e) => self.todos = ResourceState::Error(e.to_string()),
        }
    }

    pub async fn create(&mut self, form: &TodoForm) -> ClientResult<Todo> {
        let input = form.to_input()?;
        let todo = self.client.create_todo(&input).await?;
        self.load().await;
        Ok(todo)
    }

    pub async fn update(&mut self, id: i64, form: &TodoForm) -> ClientResult<Todo> {
        let input = form.to_input()?;
        let todo = self.client.update_todo(id, &input).await?;
        if let Some(entry) = self
            .todos
            .data_mut()
            .and_then(|todos| todos.iter_mut().find(|t| t.id == id))
        {
            *entry = todo.clone();
        }
        Ok(todo)
    }

    /// Delete on the server, then drop the entry locally without re-fetching.
    pub async fn delete(&mut self, id: i64) -> ClientResult<()> {
        self.client.delete_todo(id).await?;
        if let Some(todos) = self.todos.data_mut() {
            let before = todos.len();
            todos.retain(|t| t.id != id);
            self.total -= (before - todos.len()) as i64;
        }
        Ok(())
    }
}
