mod optimizer;
mod scenarios;
