/// Lifecycle of data fetched from the API.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState<T> {
    Idle,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        ResourceState::Idle
    }
}

impl<T> ResourceState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ResourceState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ResourceState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        match self {
            ResourceState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ResourceState::Error(message) => Some(message),
            _ => None,
        }
    }
}
