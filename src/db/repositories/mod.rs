mod interactions;
mod students;
