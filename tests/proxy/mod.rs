mod gateway;
mod http;
mod pipeline;
