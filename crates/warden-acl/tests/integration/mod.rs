mod authorizer;
mod embargo;
mod properties;
mod role_sharing;
