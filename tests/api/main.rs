mod health_check;
mod subscribers;
