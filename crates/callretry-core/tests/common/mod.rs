pub mod todo_server;
